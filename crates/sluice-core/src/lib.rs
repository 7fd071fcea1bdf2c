//! # sluice-core
//!
//! Configuration types and wire-level constants shared by every Sluice crate.
//!
//! Sluice sits in front of several query-engine clusters and decides, per
//! request, which *routing group* (a named set of clusters) should receive it.
//! The types here describe how that decision is configured:
//!
//! - [`RequestAnalyzerConfig`]: how much of the body to inspect and which token
//!   claim carries the user identity
//! - [`RoutingRulesConfig`]: whether the rule engine is enabled, where its rule
//!   file lives, and how it falls back to the routing-group header
//!
//! The header and cookie names the gateway understands live in [`headers`].

pub mod config;
pub mod headers;

pub use config::{
    ConfigError, GatewayConfig, HeaderFallback, IntrospectionConfig, RequestAnalyzerConfig,
    RoutingRulesConfig,
};
