//! HTTP client for the Wavelet node API.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wavelet_types::Hash;

use crate::error::ClientError;

/// Account state as reported by `GET /accounts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
    pub public_key: String,
    pub balance: u64,
    pub gas_balance: u64,
    pub stake: u64,
    pub reward: u64,
    pub nonce: u64,
    pub is_contract: bool,
    pub num_pages: u64,
}

/// Wavelet node client.
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    url: String,
}

impl NodeClient {
    /// Create a new client. The base URL may carry a trailing slash.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let url: String = url.into();
        Self {
            http,
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Base URL of the node.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Node status, passed through as returned.
    pub async fn node_info(&self) -> Result<serde_json::Value, ClientError> {
        let response = self.get(&format!("{}/node", self.url)).await?;
        Ok(response.json().await?)
    }

    /// Look up an account.
    pub async fn account(&self, id: &Hash) -> Result<AccountInfo, ClientError> {
        let response = self.get(&format!("{}/accounts/{}", self.url, id)).await?;
        Ok(response.json().await?)
    }

    /// Fetch the bytecode of a deployed contract.
    pub async fn contract_code(&self, id: &Hash) -> Result<Vec<u8>, ClientError> {
        self.fetch(&format!("{}/contract/{}", self.url, id)).await
    }

    /// Download a raw body from any URL.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.get(url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ClientError> {
        tracing::debug!(url, "GET");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = NodeClient::new("http://localhost:9000/", Duration::from_secs(1));
        assert_eq!(client.url(), "http://localhost:9000");
    }

    #[test]
    fn test_account_info_tolerates_missing_fields() {
        let info: AccountInfo =
            serde_json::from_str(r#"{"public_key": "ab", "balance": 7, "extra": true}"#).unwrap();
        assert_eq!(info.public_key, "ab");
        assert_eq!(info.balance, 7);
        assert_eq!(info.nonce, 0);
        assert!(!info.is_contract);
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        let client = NodeClient::new("http://127.0.0.1:1", Duration::from_secs(1));
        let err = client.node_info().await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)));
    }
}
