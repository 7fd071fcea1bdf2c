//! Routing rule engine configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Selects between header-based and rule-based routing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingRulesConfig {
    /// Use the rule engine. When false only the routing-group header is honored.
    #[serde(default)]
    pub enabled: bool,

    /// YAML rule file, reloaded whenever its modification time advances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,

    /// When the routing-group header is consulted instead of the rules.
    #[serde(default)]
    pub header_fallback: HeaderFallback,
}

/// When the rule-engine selector falls back to the routing-group header.
///
/// A group chosen by the rules always takes precedence over the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderFallback {
    /// Only when rule evaluation fails. Rules that decide nothing yield no group.
    OnError,
    /// When rule evaluation fails or no rule picked a group.
    #[default]
    OnErrorOrUndecided,
}
