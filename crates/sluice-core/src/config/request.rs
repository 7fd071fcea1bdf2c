//! Request analysis configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Controls how much of each request is inspected for routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestAnalyzerConfig {
    /// Largest request body, in bytes, that is parsed as a statement.
    ///
    /// Larger bodies are forwarded untouched without classification.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    /// JSON claim that carries the user name in token payloads.
    #[serde(default = "default_token_user_field")]
    pub token_user_field: String,

    /// Endpoint used to resolve opaque bearer tokens. Disabled when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introspection: Option<IntrospectionConfig>,
}

impl Default for RequestAnalyzerConfig {
    fn default() -> Self {
        Self {
            max_body_size: default_max_body_size(),
            token_user_field: default_token_user_field(),
            introspection: None,
        }
    }
}

/// Token introspection endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntrospectionConfig {
    /// URL queried with the opaque token, e.g. `https://oauth2.googleapis.com/tokeninfo`.
    pub endpoint: String,

    /// Query parameter carrying the token.
    #[serde(default = "default_token_param")]
    pub token_param: String,

    /// Upper bound on the whole round trip.
    #[serde(default = "default_introspection_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_max_body_size() -> usize {
    1_000_000
}

fn default_token_user_field() -> String {
    "email".to_string()
}

fn default_token_param() -> String {
    "access_token".to_string()
}

fn default_introspection_timeout() -> Duration {
    Duration::from_secs(5)
}
