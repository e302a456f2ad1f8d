//! Isolated execution environment for contract calls.
//!
//! [`VmRuntime`] is the long-lived factory: it owns the engine, the host
//! function linker and the compiled module cache, and is safe to share
//! across threads. Every call gets a fresh [`Environment`] (its own store,
//! linear memory and host state) which is consumed by [`Environment::invoke`].

use serde::{Deserialize, Serialize};
use wasmtime::{
    Config, Engine, ExternType, InstancePre, Linker, Module, OptLevel, Store, StoreLimitsBuilder,
    Trap, Val,
};
use wavelet_types::Hash;

use crate::cache::ModuleCache;
use crate::error::VmFault;
use crate::gas_metering::GasSchedule;
use crate::host::{
    define_host_functions, EmittedTransaction, HostError, HostOutput, HostState, SignaturePolicy,
};
use crate::{DEFAULT_MEMORY_PAGES, MAX_CODE_SIZE, WASM_PAGE_SIZE};

/// WASM magic bytes (`\0asm`).
const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Linear memory ceiling per instance, in 64 KiB pages
    pub max_memory_pages: u32,
    /// Largest accepted module, in bytes
    pub max_code_size: usize,
    /// Native stack available to wasm code, in bytes
    pub max_wasm_stack: usize,
    /// Number of compiled modules kept in memory
    pub module_cache_size: usize,
    /// Host function costs
    pub gas_schedule: GasSchedule,
    /// Answer given by `_verify_ed25519`
    pub signature_policy: SignaturePolicy,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_memory_pages: DEFAULT_MEMORY_PAGES,
            max_code_size: MAX_CODE_SIZE,
            max_wasm_stack: 512 * 1024,
            module_cache_size: 64,
            gas_schedule: GasSchedule::default(),
            signature_policy: SignaturePolicy::default(),
        }
    }
}

/// Result of one contract call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    /// Gas consumed by instructions and host calls together
    pub gas_used: u64,
    /// Bytes passed to `_result`, if any
    pub output: Option<Vec<u8>>,
    /// Bytes passed to `_log`, in call order
    pub logs: Vec<Vec<u8>>,
    /// Transactions the contract tried to send
    pub transactions: Vec<EmittedTransaction>,
    /// First integer returned by the entry point
    pub return_value: Option<i64>,
    /// Number of host function invocations
    pub host_calls: usize,
    /// Portion of `gas_used` charged by host functions
    pub host_gas: u64,
}

impl ExecutionResult {
    fn from_host(gas_used: u64, return_value: Option<i64>, host: HostOutput) -> Self {
        Self {
            gas_used,
            output: host.output,
            logs: host.logs,
            transactions: host.transactions,
            return_value,
            host_calls: host.host_calls,
            host_gas: host.host_gas,
        }
    }

    /// Logs decoded as UTF-8, lossily.
    pub fn log_lines(&self) -> Vec<String> {
        self.logs
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    }
}

/// Factory for isolated execution environments.
pub struct VmRuntime {
    engine: Engine,
    linker: Linker<HostState>,
    cache: ModuleCache,
    config: VmConfig,
}

impl VmRuntime {
    /// Create a runtime with a deterministic, fuel-metered engine.
    pub fn new(config: VmConfig) -> Result<Self, VmFault> {
        let mut wasm_config = Config::new();
        wasm_config
            .consume_fuel(true)
            .wasm_bulk_memory(true)
            .wasm_multi_value(true)
            .wasm_reference_types(true)
            .cranelift_nan_canonicalization(true)
            .max_wasm_stack(config.max_wasm_stack)
            .cranelift_opt_level(OptLevel::Speed);

        let engine = Engine::new(&wasm_config)
            .map_err(|e| VmFault::Engine(format!("Failed to create engine: {}", e)))?;

        let mut linker = Linker::new(&engine);
        define_host_functions(&mut linker)
            .map_err(|e| VmFault::Engine(format!("Failed to define host functions: {}", e)))?;

        Ok(Self {
            engine,
            linker,
            cache: ModuleCache::new(config.module_cache_size),
            config,
        })
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Fresh host state using this runtime's schedule and signature policy.
    pub fn host_state(&self) -> HostState {
        HostState::new(self.config.gas_schedule, self.config.signature_policy)
    }

    /// Validate and compile bytecode, reusing a cached module when possible.
    pub fn compile(&self, bytecode: &[u8]) -> Result<Module, VmFault> {
        if bytecode.is_empty() {
            return Err(VmFault::InvalidModule("contract code is empty".to_string()));
        }

        if bytecode.len() > self.config.max_code_size {
            return Err(VmFault::CodeSizeExceeded {
                size: bytecode.len(),
                limit: self.config.max_code_size,
            });
        }

        if bytecode.len() < 4 || bytecode[0..4] != WASM_MAGIC {
            return Err(VmFault::InvalidModule("Missing WASM magic bytes".to_string()));
        }

        let code_hash = Hash::compute(bytecode);
        if let Some(module) = self.cache.get(&code_hash) {
            tracing::debug!(%code_hash, "module cache hit");
            return Ok(module);
        }

        let module = Module::new(&self.engine, bytecode)
            .map_err(|e| VmFault::InvalidModule(format!("{:#}", e)))?;
        tracing::debug!(%code_hash, size = bytecode.len(), "compiled module");
        self.cache.insert(code_hash, module.clone());
        Ok(module)
    }

    /// Prepare a fresh, single-use environment for `bytecode`.
    ///
    /// Imports are resolved against the host function table here, so a
    /// module importing anything else is rejected before it runs.
    pub fn instantiate(
        &self,
        bytecode: &[u8],
        mut host: HostState,
    ) -> Result<Environment, VmFault> {
        let module = self.compile(bytecode)?;

        let max_memory = self.config.max_memory_pages as usize * WASM_PAGE_SIZE;
        host.limits = StoreLimitsBuilder::new()
            .memory_size(max_memory)
            .instances(1)
            .build();

        let mut store = Store::new(&self.engine, host);
        store.limiter(|state| &mut state.limits);

        let pre = self
            .linker
            .instantiate_pre(&module)
            .map_err(|e| VmFault::InvalidModule(format!("{:#}", e)))?;

        Ok(Environment { store, pre, module })
    }
}

/// One sandboxed contract instance. Not shareable; consumed by `invoke`.
pub struct Environment {
    store: Store<HostState>,
    pre: InstancePre<HostState>,
    module: Module,
}

impl Environment {
    /// Whether the module exports a function called `name`.
    pub fn has_export(&self, name: &str) -> bool {
        self.module
            .exports()
            .any(|e| e.name() == name && matches!(e.ty(), ExternType::Func(_)))
    }

    /// Run `entry_point` once with `initial_memory_image` as the payload and
    /// at most `gas_limit` gas.
    pub fn invoke(
        mut self,
        entry_point: &str,
        initial_memory_image: &[u8],
        gas_limit: u64,
    ) -> Result<ExecutionResult, VmFault> {
        let func_ty = self
            .module
            .exports()
            .find(|e| e.name() == entry_point)
            .and_then(|e| match e.ty() {
                ExternType::Func(ty) => Some(ty),
                _ => None,
            })
            .ok_or_else(|| VmFault::MissingExport(entry_point.to_string()))?;

        if func_ty.params().len() != 0 {
            return Err(VmFault::InvalidEntryPoint {
                name: entry_point.to_string(),
                reason: format!("expected no parameters, found {}", func_ty.params().len()),
            });
        }

        self.store
            .data_mut()
            .set_payload(initial_memory_image.to_vec());
        self.store
            .set_fuel(gas_limit)
            .map_err(|e| VmFault::Engine(e.to_string()))?;

        // Start functions run here and are metered like everything else.
        let mut results = vec![Val::I32(0); func_ty.results().len()];
        let outcome = match self.pre.instantiate(&mut self.store) {
            Ok(instance) => match instance.get_func(&mut self.store, entry_point) {
                Some(func) => func.call(&mut self.store, &[], &mut results),
                None => return Err(VmFault::MissingExport(entry_point.to_string())),
            },
            Err(e) => Err(e),
        };

        let remaining = self
            .store
            .get_fuel()
            .map_err(|e| VmFault::Engine(e.to_string()))?;
        let host = self.store.into_data().into_parts();

        if let Err(e) = outcome {
            let fault = classify(e, gas_limit, host);
            tracing::debug!(entry_point, %fault, "contract call failed");
            return Err(fault);
        }

        let gas_used = gas_limit.saturating_sub(remaining);
        let return_value = results.first().and_then(|v| match v {
            Val::I32(n) => Some(i64::from(*n)),
            Val::I64(n) => Some(*n),
            _ => None,
        });
        tracing::debug!(
            entry_point,
            gas_used,
            host_calls = host.host_calls,
            "contract call finished"
        );

        Ok(ExecutionResult::from_host(gas_used, return_value, host))
    }
}

/// Translate an engine error into a fault. Running out of fuel, whether in
/// wasm code or while a host function charges, is `GasExhausted` and keeps
/// what the contract emitted up to that point.
fn classify(err: wasmtime::Error, gas_limit: u64, host: HostOutput) -> VmFault {
    let exhausted = match err.downcast_ref::<HostError>() {
        Some(HostError::OutOfGas { .. }) => true,
        Some(other) => return VmFault::Trap(other.to_string()),
        None => match err.downcast_ref::<Trap>() {
            Some(Trap::OutOfFuel) => true,
            Some(other) => return VmFault::Trap(other.to_string()),
            None => false,
        },
    };

    if !exhausted {
        return VmFault::Trap(format!("{:#}", err));
    }

    VmFault::GasExhausted {
        limit: gas_limit,
        partial: Box::new(ExecutionResult::from_host(gas_limit, None, host)),
    }
}
