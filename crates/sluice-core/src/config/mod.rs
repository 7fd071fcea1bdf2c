//! Configuration types for the Sluice gateway.
//!
//! Configuration is loaded from a single YAML file:
//!
//! ```yaml
//! request_analyzer:
//!   max_body_size: 1000000
//!   token_user_field: email
//!   introspection:
//!     endpoint: https://oauth2.googleapis.com/tokeninfo
//!     timeout: 5s
//! routing_rules:
//!   enabled: true
//!   rules_file: routing_rules.yaml
//!   header_fallback: on_error_or_undecided
//! ```
//!
//! Every section and field is optional; missing values take the defaults
//! documented on each type.

pub mod request;
pub mod routing;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use request::{IntrospectionConfig, RequestAnalyzerConfig};
pub use routing::{HeaderFallback, RoutingRulesConfig};

/// Complete gateway configuration relevant to routing-group selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// How inbound requests are inspected.
    #[serde(default)]
    pub request_analyzer: RequestAnalyzerConfig,

    /// Rule-engine routing settings.
    #[serde(default)]
    pub routing_rules: RoutingRulesConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayConfig {
    /// Load configuration from a YAML file.
    ///
    /// A relative `routing_rules.rules_file` is resolved against the directory
    /// containing the configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if let Some(rules_file) = &config.routing_rules.rules_file {
            if rules_file.is_relative() {
                config.routing_rules.rules_file = Some(base_dir.join(rules_file));
            }
        }

        Ok(config)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_analyzer.max_body_size == 0 {
            return Err(ConfigError::Config(
                "request_analyzer.max_body_size must be greater than zero".to_string(),
            ));
        }
        if self.request_analyzer.token_user_field.trim().is_empty() {
            return Err(ConfigError::Config(
                "request_analyzer.token_user_field must not be empty".to_string(),
            ));
        }
        if self.routing_rules.enabled && self.routing_rules.rules_file.is_none() {
            return Err(ConfigError::Config(
                "routing_rules.rules_file is required when routing_rules.enabled is true"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
