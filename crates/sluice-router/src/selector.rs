//! Routing group selectors.

use crate::engine::{Evaluation, Facts, decide, evaluate};
use crate::error::{RuleError, SetupError};
use crate::processed::{ProcessedRequest, RequestAnalyzer};
use crate::rules::{FileRuleSource, RuleStore};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request};
use serde::Serialize;
use sluice_core::headers::ROUTING_GROUP;
use sluice_core::{GatewayConfig, HeaderFallback};
use std::sync::Arc;

/// Picks the routing group for a request.
///
/// `None` means the default group. Implementations may read the body but must
/// leave an equivalent one in place for forwarding.
#[async_trait]
pub trait RoutingGroupSelector: Send + Sync {
    async fn find_routing_group(&self, request: &mut Request<Body>) -> Option<String>;
}

/// Uses the client's `X-Trino-Routing-Group` header.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderRoutingGroupSelector;

#[async_trait]
impl RoutingGroupSelector for HeaderRoutingGroupSelector {
    async fn find_routing_group(&self, request: &mut Request<Body>) -> Option<String> {
        header_group(request.headers())
    }
}

fn header_group(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ROUTING_GROUP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Everything the rule engine worked out for one request.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub processed: ProcessedRequest,
    pub evaluation: Evaluation,
}

/// Runs hot-reloaded routing rules against classified requests.
#[derive(Debug)]
pub struct RulesEngineRoutingGroupSelector {
    store: RuleStore,
    analyzer: RequestAnalyzer,
    header_fallback: HeaderFallback,
}

impl RulesEngineRoutingGroupSelector {
    pub fn new(store: RuleStore, analyzer: RequestAnalyzer, header_fallback: HeaderFallback) -> Self {
        Self {
            store,
            analyzer,
            header_fallback,
        }
    }

    /// Build from configuration, loading the rule file once up front.
    pub async fn from_config(config: &GatewayConfig) -> Result<Self, SetupError> {
        let routing = &config.routing_rules;
        let path = routing
            .rules_file
            .as_ref()
            .ok_or(SetupError::MissingRulesFile)?;
        let analyzer = RequestAnalyzer::from_config(&config.request_analyzer)?;
        let store = RuleStore::load(Arc::new(FileRuleSource::new(path))).await;

        tracing::info!(
            rules_file = %path.display(),
            rules = store.snapshot().len(),
            header_fallback = ?routing.header_fallback,
            "Routing rules enabled"
        );
        Ok(Self::new(store, analyzer, routing.header_fallback))
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Refresh the rules and decide. Errors come only from the refresh.
    pub async fn route(&self, request: &mut Request<Body>) -> Result<Option<String>, RuleError> {
        self.store.ensure_fresh().await?;
        let processed = self.analyzer.analyze(request).await;
        Ok(decide(&self.store.snapshot(), &processed, &*request))
    }

    /// Like [`route`](Self::route), but keep the facts and every rule that
    /// fired.
    pub async fn explain(&self, request: &mut Request<Body>) -> Result<Explanation, RuleError> {
        self.store.ensure_fresh().await?;
        let processed = self.analyzer.analyze(request).await;
        let evaluation = evaluate(&self.store.snapshot(), &Facts::new(&*request, &processed));
        Ok(Explanation {
            processed,
            evaluation,
        })
    }
}

#[async_trait]
impl RoutingGroupSelector for RulesEngineRoutingGroupSelector {
    async fn find_routing_group(&self, request: &mut Request<Body>) -> Option<String> {
        let header = header_group(request.headers());

        match self.route(request).await {
            Ok(Some(group)) => Some(group),
            Ok(None) => match self.header_fallback {
                HeaderFallback::OnErrorOrUndecided => header,
                HeaderFallback::OnError => None,
            },
            Err(e) => {
                tracing::error!(
                    error = %e,
                    header = ?header,
                    "Routing rules unavailable; using routing group header"
                );
                header
            }
        }
    }
}

/// Build the selector described by `config`.
pub async fn from_config(
    config: &GatewayConfig,
) -> Result<Arc<dyn RoutingGroupSelector>, SetupError> {
    if !config.routing_rules.enabled {
        tracing::info!("Routing rules disabled; using routing group header");
        return Ok(Arc::new(HeaderRoutingGroupSelector));
    }
    Ok(Arc::new(RulesEngineRoutingGroupSelector::from_config(config).await?))
}
