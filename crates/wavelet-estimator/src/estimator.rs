//! Dry-run gas estimation.

use std::sync::Arc;
use std::time::Instant;
use wavelet_abi::{encode_invocation_envelope, encode_parameters, CallParameter, ContractPayload};
use wavelet_vm::{ExecutionResult, VmRuntime};

use crate::client::NodeClient;
use crate::config::EstimatorConfig;
use crate::error::EstimationError;
use crate::source::ContractSource;

/// Prefix the contract toolchain puts on every callable export.
pub const ENTRY_POINT_PREFIX: &str = "_contract_on_";

/// Export name for a user-facing function name.
pub fn entry_point(function_name: &str) -> String {
    format!("{}{}", ENTRY_POINT_PREFIX, function_name)
}

/// Runs contract calls in isolation and reports the gas they consume.
///
/// Cloning is cheap; clones share the compiled module cache. Calls are
/// independent and may run concurrently.
#[derive(Clone)]
pub struct GasEstimator {
    runtime: Arc<VmRuntime>,
    client: NodeClient,
    default_gas_limit: u64,
}

impl GasEstimator {
    pub fn new(config: EstimatorConfig) -> Result<Self, EstimationError> {
        let runtime = VmRuntime::new(config.vm.clone())?;
        let client = NodeClient::new(config.node_url.clone(), config.request_timeout());
        Ok(Self::with_runtime(
            Arc::new(runtime),
            client,
            config.default_gas_limit,
        ))
    }

    /// Build around an existing runtime, e.g. to share its module cache.
    pub fn with_runtime(
        runtime: Arc<VmRuntime>,
        client: NodeClient,
        default_gas_limit: u64,
    ) -> Self {
        Self {
            runtime,
            client,
            default_gas_limit,
        }
    }

    pub fn runtime(&self) -> &VmRuntime {
        &self.runtime
    }

    pub fn client(&self) -> &NodeClient {
        &self.client
    }

    pub fn default_gas_limit(&self) -> u64 {
        self.default_gas_limit
    }

    /// Estimate the gas `function_name` consumes when called with
    /// `amount` attached and the given parameters.
    ///
    /// The limit is checked before the source is resolved, so an invalid
    /// limit never touches the filesystem or the network.
    pub async fn estimate(
        &self,
        source: &ContractSource,
        function_name: &str,
        amount: u64,
        parameters: &[CallParameter],
        gas_limit: Option<u64>,
    ) -> Result<ExecutionResult, EstimationError> {
        let gas_limit = self.check_limit(gas_limit)?;
        let bytecode = source.resolve(&self.client).await?;
        tracing::debug!(%source, size = bytecode.len(), "resolved contract");
        self.run(&bytecode, function_name, amount, parameters, gas_limit)
    }

    /// Same as [`estimate`](Self::estimate) for bytecode already in memory.
    pub fn estimate_bytecode(
        &self,
        bytecode: &[u8],
        function_name: &str,
        amount: u64,
        parameters: &[CallParameter],
        gas_limit: Option<u64>,
    ) -> Result<ExecutionResult, EstimationError> {
        let gas_limit = self.check_limit(gas_limit)?;
        self.run(bytecode, function_name, amount, parameters, gas_limit)
    }

    fn check_limit(&self, gas_limit: Option<u64>) -> Result<u64, EstimationError> {
        match gas_limit.unwrap_or(self.default_gas_limit) {
            0 => Err(EstimationError::InvalidLimit(0)),
            limit => Ok(limit),
        }
    }

    fn run(
        &self,
        bytecode: &[u8],
        function_name: &str,
        amount: u64,
        parameters: &[CallParameter],
        gas_limit: u64,
    ) -> Result<ExecutionResult, EstimationError> {
        let params = encode_parameters(parameters)?;
        let payload = ContractPayload::for_estimation(amount, params);
        let envelope = encode_invocation_envelope(&payload);

        let entry_point = entry_point(function_name);
        let started = Instant::now();

        let environment = self
            .runtime
            .instantiate(bytecode, self.runtime.host_state())?;
        let outcome = environment.invoke(&entry_point, &envelope, gas_limit);

        match &outcome {
            Ok(result) => tracing::info!(
                function = function_name,
                gas_used = result.gas_used,
                host_gas = result.host_gas,
                host_calls = result.host_calls,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "estimation complete"
            ),
            Err(fault) => tracing::info!(
                function = function_name,
                gas_limit,
                %fault,
                logs = fault.partial_result().map_or(0, |p| p.logs.len()),
                "estimation failed"
            ),
        }

        Ok(outcome?)
    }
}
