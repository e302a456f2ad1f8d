//! Estimator configuration.
//!
//! Loaded from TOML; every field has a default so a partial file works.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use wavelet_vm::VmConfig;

use crate::error::ConfigError;

/// Gas limit used when the caller does not give one.
pub const DEFAULT_GAS_LIMIT: u64 = 10_000_000_000;

/// Estimator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Wavelet node HTTP API
    pub node_url: String,
    /// Gas limit when none is supplied
    pub default_gas_limit: u64,
    /// Timeout for node and URL fetches
    pub request_timeout_secs: u64,
    /// Execution environment settings
    pub vm: VmConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            node_url: "http://localhost:9000".to_string(),
            default_gas_limit: DEFAULT_GAS_LIMIT,
            request_timeout_secs: 30,
            vm: VmConfig::default(),
        }
    }
}

impl EstimatorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: EstimatorConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_gas_limit == 0 {
            return Err(ConfigError::Invalid("default_gas_limit cannot be 0".into()));
        }

        if self.vm.max_memory_pages == 0 {
            return Err(ConfigError::Invalid("vm.max_memory_pages cannot be 0".into()));
        }

        if self.vm.module_cache_size == 0 {
            return Err(ConfigError::Invalid("vm.module_cache_size cannot be 0".into()));
        }

        if !self.node_url.starts_with("http://") && !self.node_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "node_url must be an http(s) URL, got '{}'",
                self.node_url
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wavelet_vm::SignaturePolicy;

    #[test]
    fn test_default_config() {
        let config = EstimatorConfig::default();
        assert_eq!(config.default_gas_limit, 10_000_000_000);
        assert_eq!(config.vm.max_memory_pages, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
node_url = "http://10.0.0.1:9000"

[vm]
signature_policy = "verify"

[vm.gas_schedule]
log_base = 1
"#
        )
        .unwrap();

        let config = EstimatorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.node_url, "http://10.0.0.1:9000");
        assert_eq!(config.default_gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(config.vm.signature_policy, SignaturePolicy::Verify);
        assert_eq!(config.vm.gas_schedule.log_base, 1);
        assert_eq!(config.vm.gas_schedule.log_per_byte, 8);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EstimatorConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: EstimatorConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_config() {
        let config = EstimatorConfig {
            default_gas_limit: 0,
            ..EstimatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = EstimatorConfig {
            node_url: "localhost:9000".into(),
            ..EstimatorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = EstimatorConfig::from_file(Path::new("/nonexistent/wavelet.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
