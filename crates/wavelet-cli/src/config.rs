//! CLI configuration management.
//!
//! A TOML file holds the estimator settings plus logging options. Flags
//! given on the command line override the file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use wavelet_estimator::EstimatorConfig;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log filter directive, e.g. `info` or `wavelet_vm=debug`
    pub log_level: String,
    /// Emit logs as JSON
    pub json_logs: bool,
    /// Estimation settings
    pub estimator: EstimatorConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
            estimator: EstimatorConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from `path`, or the defaults when none is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
                })?;
                toml::from_str(&contents).map_err(|e| {
                    anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
                })?
            }
            None => Self::default(),
        };
        Ok(config)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, node_url: Option<String>, log_level: Option<String>) -> Self {
        if let Some(url) = node_url {
            self.estimator.node_url = url;
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("log_level cannot be empty");
        }
        self.estimator.validate()?;
        Ok(())
    }
}
