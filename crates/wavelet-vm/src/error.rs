use thiserror::Error;

use crate::runtime::ExecutionResult;

/// Faults raised by the execution environment.
///
/// `GasExhausted` is a legitimate estimation outcome ("needs more than the
/// limit"); every other variant means the call itself is broken.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmFault {
    #[error("Trap: {0}")]
    Trap(String),

    /// `partial` holds whatever the contract emitted before it ran out,
    /// with `gas_used` equal to the limit.
    #[error("Gas exhausted: limit {limit}")]
    GasExhausted {
        limit: u64,
        partial: Box<ExecutionResult>,
    },

    #[error("Function not exported: {0}")]
    MissingExport(String),

    #[error("Entry point {name} cannot be called: {reason}")]
    InvalidEntryPoint { name: String, reason: String },

    #[error("Invalid WASM module: {0}")]
    InvalidModule(String),

    #[error("Code size exceeded: {size} > {limit}")]
    CodeSizeExceeded { size: usize, limit: usize },

    #[error("Engine error: {0}")]
    Engine(String),
}

impl VmFault {
    /// Whether the fault is the gas limit being reached.
    pub fn is_gas_exhausted(&self) -> bool {
        matches!(self, VmFault::GasExhausted { .. })
    }

    /// Output, logs and transactions recorded before gas ran out.
    pub fn partial_result(&self) -> Option<&ExecutionResult> {
        match self {
            VmFault::GasExhausted { partial, .. } => Some(partial),
            _ => None,
        }
    }
}
