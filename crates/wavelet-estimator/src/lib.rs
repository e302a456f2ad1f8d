//! Wavelet Estimator - Dry-run gas estimation for contract calls.
//!
//! Loads a contract from bytes, a file, a URL or a node, encodes the call
//! parameters into an invocation envelope and runs the requested function
//! in an isolated, metered VM instance.
//!
//! ```ignore
//! let estimator = GasEstimator::new(EstimatorConfig::default())?;
//! let source = ContractSource::parse("token.wasm");
//! let result = estimator
//!     .estimate(&source, "transfer", 0, &[CallParameter::Uint64(10)], None)
//!     .await?;
//! println!("gas used: {}", result.gas_used);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod estimator;
pub mod source;

pub use client::{AccountInfo, NodeClient};
pub use config::{EstimatorConfig, DEFAULT_GAS_LIMIT};
pub use error::{ClientError, ConfigError, EstimationError};
pub use estimator::{entry_point, GasEstimator, ENTRY_POINT_PREFIX};
pub use source::ContractSource;

pub use wavelet_abi::{ByteSource, CallParameter};
pub use wavelet_vm::{ExecutionResult, VmConfig, VmFault};
