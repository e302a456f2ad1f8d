//! Error types for estimation.

use thiserror::Error;
use wavelet_abi::EncodingError;
use wavelet_vm::{ExecutionResult, VmFault};

/// Estimation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimationError {
    /// Bytecode could not be loaded; retrying may help
    #[error("Contract source unavailable: {0}")]
    SourceUnavailable(String),

    /// Gas limit of zero
    #[error("Invalid gas limit: {0}")]
    InvalidLimit(u64),

    /// Malformed parameters
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Execution fault, including running out of gas
    #[error("VM fault: {0}")]
    Vm(#[from] VmFault),
}

impl EstimationError {
    /// True when the call simply needs more gas than was allowed.
    pub fn is_gas_exhausted(&self) -> bool {
        matches!(self, EstimationError::Vm(fault) if fault.is_gas_exhausted())
    }

    /// What the call emitted before running out of gas, if it did.
    pub fn partial_result(&self) -> Option<&ExecutionResult> {
        match self {
            EstimationError::Vm(fault) => fault.partial_result(),
            _ => None,
        }
    }
}

/// Node client errors.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Non-success HTTP status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Connection(e.to_string())
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
