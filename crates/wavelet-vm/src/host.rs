//! Host function table.
//!
//! The only interface a contract has to the outside world. Every import
//! lives in the `env` module and follows the wasm32 ABI: pointers and
//! lengths are `i32` offsets into the contract's exported `memory`.
//!
//! During estimation nothing leaves the sandbox: transactions and logs are
//! recorded, signature checks follow a fixed [`SignaturePolicy`], and only
//! hashing runs for real since it is a pure function.

use crate::gas_metering::GasSchedule;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use wasmtime::{Caller, Extern, Linker, Memory, StoreLimits};
use wavelet_crypto::HashAlgorithm;

/// Import module name used by Wavelet contracts.
pub const HOST_MODULE: &str = "env";

/// Status returned to the contract when a host check succeeds.
const STATUS_OK: i32 = 0;
/// Status returned to the contract when a host check fails.
const STATUS_FAILED: i32 = 1;

/// The fixed set of host capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostFunction {
    SendTransaction,
    PayloadLen,
    Payload,
    Result,
    Log,
    VerifyEd25519,
    Hash(HashAlgorithm),
    Abort,
}

impl HostFunction {
    pub const ALL: [HostFunction; 11] = [
        HostFunction::SendTransaction,
        HostFunction::PayloadLen,
        HostFunction::Payload,
        HostFunction::Result,
        HostFunction::Log,
        HostFunction::VerifyEd25519,
        HostFunction::Hash(HashAlgorithm::Blake2b256),
        HostFunction::Hash(HashAlgorithm::Blake2b512),
        HostFunction::Hash(HashAlgorithm::Sha256),
        HostFunction::Hash(HashAlgorithm::Sha512),
        HostFunction::Abort,
    ];

    /// Name of the import inside [`HOST_MODULE`].
    pub const fn import_name(self) -> &'static str {
        match self {
            HostFunction::SendTransaction => "_send_transaction",
            HostFunction::PayloadLen => "_payload_len",
            HostFunction::Payload => "_payload",
            HostFunction::Result => "_result",
            HostFunction::Log => "_log",
            HostFunction::VerifyEd25519 => "_verify_ed25519",
            HostFunction::Hash(HashAlgorithm::Blake2b256) => "_hash_blake2b_256",
            HostFunction::Hash(HashAlgorithm::Blake2b512) => "_hash_blake2b_512",
            HostFunction::Hash(HashAlgorithm::Sha256) => "_hash_sha256",
            HostFunction::Hash(HashAlgorithm::Sha512) => "_hash_sha512",
            HostFunction::Abort => "abort",
        }
    }
}

impl fmt::Display for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.import_name())
    }
}

/// How `_verify_ed25519` answers during estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignaturePolicy {
    /// Every signature is reported valid, so the success path is measured.
    #[default]
    AlwaysValid,
    /// Every signature is reported invalid.
    AlwaysInvalid,
    /// Run real ed25519 verification on the supplied bytes.
    Verify,
}

/// A transaction the contract asked to send. Recorded, never submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedTransaction {
    pub tag: u8,
    pub payload: Vec<u8>,
}

/// One host call and the gas it was charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCallRecord {
    pub function: HostFunction,
    pub cost: u64,
}

/// Failures raised from inside a host function. They abort the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("{function} out of gas: cost {cost}, remaining {remaining}")]
    OutOfGas {
        function: HostFunction,
        cost: u64,
        remaining: u64,
    },

    #[error("Out of bounds memory access: ptr {ptr}, len {len}")]
    OutOfBounds { ptr: u32, len: u32 },

    #[error("Module does not export a linear memory named \"memory\"")]
    MissingMemory,

    #[error("Contract aborted at {line}:{column}")]
    Aborted { line: u32, column: u32 },

    #[error("Fuel error: {0}")]
    Fuel(String),
}

/// Per-execution host state. Owned by exactly one store and dropped with it.
pub struct HostState {
    schedule: GasSchedule,
    signature_policy: SignaturePolicy,
    payload: Vec<u8>,
    output: Option<Vec<u8>>,
    logs: Vec<Vec<u8>>,
    transactions: Vec<EmittedTransaction>,
    records: Vec<HostCallRecord>,
    pub(crate) limits: StoreLimits,
}

impl HostState {
    pub fn new(schedule: GasSchedule, signature_policy: SignaturePolicy) -> Self {
        Self {
            schedule,
            signature_policy,
            payload: Vec::new(),
            output: None,
            logs: Vec::new(),
            transactions: Vec::new(),
            records: Vec::new(),
            limits: StoreLimits::default(),
        }
    }

    pub fn schedule(&self) -> &GasSchedule {
        &self.schedule
    }

    pub fn signature_policy(&self) -> SignaturePolicy {
        self.signature_policy
    }

    /// Install the bytes served by `_payload_len` / `_payload`.
    pub fn set_payload(&mut self, payload: Vec<u8>) {
        self.payload = payload;
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    pub fn logs(&self) -> &[Vec<u8>] {
        &self.logs
    }

    pub fn transactions(&self) -> &[EmittedTransaction] {
        &self.transactions
    }

    pub fn records(&self) -> &[HostCallRecord] {
        &self.records
    }

    /// Total gas charged by host functions so far.
    pub fn host_gas(&self) -> u64 {
        self.records.iter().map(|r| r.cost).sum()
    }

    pub fn send_transaction(&mut self, tag: u8, payload: Vec<u8>) {
        self.transactions.push(EmittedTransaction { tag, payload });
    }

    /// The last call wins if a contract sets its result twice.
    pub fn emit_result(&mut self, data: Vec<u8>) {
        self.output = Some(data);
    }

    pub fn log(&mut self, message: Vec<u8>) {
        self.logs.push(message);
    }

    pub fn verify_signature(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        match self.signature_policy {
            SignaturePolicy::AlwaysValid => true,
            SignaturePolicy::AlwaysInvalid => false,
            SignaturePolicy::Verify => {
                wavelet_crypto::ed25519_verify(public_key, message, signature).is_ok()
            }
        }
    }

    pub fn hash(&self, algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
        algorithm.digest(data)
    }

    fn record(&mut self, function: HostFunction, cost: u64) {
        self.records.push(HostCallRecord { function, cost });
    }

    pub(crate) fn into_parts(self) -> HostOutput {
        HostOutput {
            output: self.output,
            logs: self.logs,
            transactions: self.transactions,
            host_calls: self.records.len(),
            host_gas: self.records.iter().map(|r| r.cost).sum(),
        }
    }
}

/// What survives of a [`HostState`] once execution is over.
pub(crate) struct HostOutput {
    pub output: Option<Vec<u8>>,
    pub logs: Vec<Vec<u8>>,
    pub transactions: Vec<EmittedTransaction>,
    pub host_calls: usize,
    pub host_gas: u64,
}

/// Register every [`HostFunction`] on `linker`.
pub(crate) fn define_host_functions(linker: &mut Linker<HostState>) -> wasmtime::Result<()> {
    linker.func_wrap(
        HOST_MODULE,
        HostFunction::SendTransaction.import_name(),
        |mut caller: Caller<'_, HostState>, tag: i32, ptr: i32, len: i32| -> wasmtime::Result<()> {
            let memory = memory(&mut caller)?;
            let payload = read_bytes(&caller, &memory, ptr, len)?;
            let cost = caller.data().schedule.send_transaction_cost(payload.len());
            charge(&mut caller, HostFunction::SendTransaction, cost)?;
            // The ABI passes the tag as a u8 widened to i32.
            caller.data_mut().send_transaction(tag as u8, payload);
            Ok(())
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        HostFunction::PayloadLen.import_name(),
        |mut caller: Caller<'_, HostState>| -> wasmtime::Result<i32> {
            let cost = caller.data().schedule.payload_len;
            charge(&mut caller, HostFunction::PayloadLen, cost)?;
            Ok(caller.data().payload.len() as i32)
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        HostFunction::Payload.import_name(),
        |mut caller: Caller<'_, HostState>, ptr: i32| -> wasmtime::Result<()> {
            let memory = memory(&mut caller)?;
            let cost = {
                let state = caller.data();
                state.schedule.payload_cost(state.payload.len())
            };
            charge(&mut caller, HostFunction::Payload, cost)?;
            let payload = std::mem::take(&mut caller.data_mut().payload);
            let written = write_bytes(&mut caller, &memory, ptr, &payload);
            caller.data_mut().payload = payload;
            written?;
            Ok(())
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        HostFunction::Result.import_name(),
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> wasmtime::Result<()> {
            let memory = memory(&mut caller)?;
            let data = read_bytes(&caller, &memory, ptr, len)?;
            let cost = caller.data().schedule.result_cost(data.len());
            charge(&mut caller, HostFunction::Result, cost)?;
            caller.data_mut().emit_result(data);
            Ok(())
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        HostFunction::Log.import_name(),
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> wasmtime::Result<()> {
            let memory = memory(&mut caller)?;
            let message = read_bytes(&caller, &memory, ptr, len)?;
            let cost = caller.data().schedule.log_cost(message.len());
            charge(&mut caller, HostFunction::Log, cost)?;
            tracing::trace!(message = %String::from_utf8_lossy(&message), "contract log");
            caller.data_mut().log(message);
            Ok(())
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        HostFunction::VerifyEd25519.import_name(),
        |mut caller: Caller<'_, HostState>,
         key_ptr: i32,
         key_len: i32,
         msg_ptr: i32,
         msg_len: i32,
         sig_ptr: i32,
         sig_len: i32|
         -> wasmtime::Result<i32> {
            let memory = memory(&mut caller)?;
            let key = read_bytes(&caller, &memory, key_ptr, key_len)?;
            let message = read_bytes(&caller, &memory, msg_ptr, msg_len)?;
            let signature = read_bytes(&caller, &memory, sig_ptr, sig_len)?;
            let cost = caller.data().schedule.ed25519_verify;
            charge(&mut caller, HostFunction::VerifyEd25519, cost)?;
            if caller.data().verify_signature(&key, &message, &signature) {
                Ok(STATUS_OK)
            } else {
                Ok(STATUS_FAILED)
            }
        },
    )?;

    for algorithm in HashAlgorithm::ALL {
        let function = HostFunction::Hash(algorithm);
        linker.func_wrap(
            HOST_MODULE,
            function.import_name(),
            move |mut caller: Caller<'_, HostState>,
                  in_ptr: i32,
                  in_len: i32,
                  out_ptr: i32,
                  out_len: i32|
                  -> wasmtime::Result<i32> {
                let memory = memory(&mut caller)?;
                let input = read_bytes(&caller, &memory, in_ptr, in_len)?;
                let cost = caller.data().schedule.hash_cost(algorithm, input.len());
                charge(&mut caller, function, cost)?;
                if out_len as u32 as usize != algorithm.output_len() {
                    return Ok(STATUS_FAILED);
                }
                let digest = caller.data().hash(algorithm, &input);
                write_bytes(&mut caller, &memory, out_ptr, &digest)?;
                Ok(STATUS_OK)
            },
        )?;
    }

    linker.func_wrap(
        HOST_MODULE,
        HostFunction::Abort.import_name(),
        |mut caller: Caller<'_, HostState>,
         _msg_ptr: i32,
         _file_ptr: i32,
         line: i32,
         column: i32|
         -> wasmtime::Result<()> {
            caller.data_mut().record(HostFunction::Abort, 0);
            Err(HostError::Aborted {
                line: line as u32,
                column: column as u32,
            }
            .into())
        },
    )?;

    Ok(())
}

/// Deduct `cost` from the remaining fuel before the host call takes effect.
fn charge(
    caller: &mut Caller<'_, HostState>,
    function: HostFunction,
    cost: u64,
) -> Result<(), HostError> {
    let remaining = caller
        .get_fuel()
        .map_err(|e| HostError::Fuel(e.to_string()))?;

    if cost > remaining {
        caller
            .set_fuel(0)
            .map_err(|e| HostError::Fuel(e.to_string()))?;
        return Err(HostError::OutOfGas {
            function,
            cost,
            remaining,
        });
    }

    caller
        .set_fuel(remaining - cost)
        .map_err(|e| HostError::Fuel(e.to_string()))?;
    caller.data_mut().record(function, cost);
    tracing::trace!(%function, cost, remaining = remaining - cost, "host call charged");
    Ok(())
}

fn memory(caller: &mut Caller<'_, HostState>) -> Result<Memory, HostError> {
    caller
        .get_export("memory")
        .and_then(Extern::into_memory)
        .ok_or(HostError::MissingMemory)
}

fn bounds(ptr: i32, len: i32) -> Result<(usize, usize), HostError> {
    let (ptr, len) = (ptr as u32, len as u32);
    let start = ptr as usize;
    let end = start
        .checked_add(len as usize)
        .ok_or(HostError::OutOfBounds { ptr, len })?;
    Ok((start, end))
}

fn read_bytes(
    caller: &Caller<'_, HostState>,
    memory: &Memory,
    ptr: i32,
    len: i32,
) -> Result<Vec<u8>, HostError> {
    let (start, end) = bounds(ptr, len)?;
    memory
        .data(caller)
        .get(start..end)
        .map(<[u8]>::to_vec)
        .ok_or(HostError::OutOfBounds {
            ptr: ptr as u32,
            len: len as u32,
        })
}

fn write_bytes(
    caller: &mut Caller<'_, HostState>,
    memory: &Memory,
    ptr: i32,
    data: &[u8],
) -> Result<(), HostError> {
    let len = data.len() as u32;
    let (start, end) = bounds(ptr, len as i32)?;
    let target = memory
        .data_mut(caller)
        .get_mut(start..end)
        .ok_or(HostError::OutOfBounds {
            ptr: ptr as u32,
            len,
        })?;
    target.copy_from_slice(data);
    Ok(())
}
