//! Where contract bytecode comes from.

use std::fmt;
use std::path::PathBuf;
use wavelet_types::Hash;

use crate::client::NodeClient;
use crate::error::{ClientError, EstimationError};

/// A contract bytecode source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractSource {
    /// Bytecode already in memory
    Bytes(Vec<u8>),
    /// A local `.wasm` file
    File(PathBuf),
    /// Any HTTP(S) URL serving the raw module
    Url(String),
    /// A contract deployed on the configured node
    Node { contract_id: Hash },
}

impl ContractSource {
    /// Interpret a command-line argument.
    ///
    /// `http://` and `https://` are URLs, 64 hex characters (optionally
    /// `0x`-prefixed) name a deployed contract, anything else is a path.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            return ContractSource::Url(s.to_string());
        }

        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if hex.len() == Hash::LEN * 2 {
            if let Ok(contract_id) = hex.parse::<Hash>() {
                return ContractSource::Node { contract_id };
            }
        }

        ContractSource::File(PathBuf::from(s))
    }

    /// Load the bytecode.
    pub async fn resolve(&self, client: &NodeClient) -> Result<Vec<u8>, EstimationError> {
        let bytecode = match self {
            ContractSource::Bytes(bytes) => bytes.clone(),
            ContractSource::File(path) => tokio::fs::read(path).await.map_err(|e| {
                EstimationError::SourceUnavailable(format!("{}: {}", path.display(), e))
            })?,
            ContractSource::Url(url) => client.fetch(url).await.map_err(|e| unavailable(self, e))?,
            ContractSource::Node { contract_id } => client
                .contract_code(contract_id)
                .await
                .map_err(|e| unavailable(self, e))?,
        };

        if bytecode.is_empty() {
            return Err(EstimationError::SourceUnavailable(format!(
                "{} returned no bytecode",
                self
            )));
        }

        Ok(bytecode)
    }
}

fn unavailable(source: &ContractSource, err: ClientError) -> EstimationError {
    tracing::warn!(%source, error = %err, "failed to fetch contract");
    EstimationError::SourceUnavailable(err.to_string())
}

impl fmt::Display for ContractSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractSource::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            ContractSource::File(path) => write!(f, "{}", path.display()),
            ContractSource::Url(url) => write!(f, "{}", url),
            ContractSource::Node { contract_id } => write!(f, "contract {}", contract_id),
        }
    }
}

impl From<Vec<u8>> for ContractSource {
    fn from(bytes: Vec<u8>) -> Self {
        ContractSource::Bytes(bytes)
    }
}
