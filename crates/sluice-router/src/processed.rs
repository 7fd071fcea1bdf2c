//! Per-request facts used by routing rules.

use crate::body::{BodyRead, read_restorable};
use axum::body::Body;
use axum::http::{HeaderMap, Request};
use serde::Serialize;
use sluice_core::RequestAnalyzerConfig;
use sluice_core::headers::{CATALOG, SCHEMA};
use sluice_identity::{IdentityError, IdentityResolver};
use sluice_sql::{Classification, QualifiedName, SessionDefaults, StatementClassifier};
use std::collections::BTreeSet;

/// What the gateway knows about one request. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessedRequest {
    /// Request text, empty when the body was skipped.
    pub body: String,
    pub query_type: Option<String>,
    pub tables: BTreeSet<QualifiedName>,
    pub default_catalog: String,
    pub default_schema: String,
    pub catalogs: BTreeSet<String>,
    pub schemas: BTreeSet<String>,
    pub catalog_schemas: BTreeSet<String>,
    pub user: Option<String>,
}

impl ProcessedRequest {
    pub fn new(
        body: String,
        classification: Classification,
        defaults: SessionDefaults,
        user: Option<String>,
    ) -> Self {
        Self {
            body,
            query_type: classification.query_type,
            tables: classification.tables,
            default_catalog: defaults.catalog,
            default_schema: defaults.schema,
            catalogs: classification.catalogs,
            schemas: classification.schemas,
            catalog_schemas: classification.catalog_schemas,
            user,
        }
    }
}

/// Builds a [`ProcessedRequest`] from an inbound request.
#[derive(Debug, Clone)]
pub struct RequestAnalyzer {
    classifier: StatementClassifier,
    identity: IdentityResolver,
    max_body_size: usize,
}

impl RequestAnalyzer {
    pub fn new(
        classifier: StatementClassifier,
        identity: IdentityResolver,
        max_body_size: usize,
    ) -> Self {
        Self {
            classifier,
            identity,
            max_body_size,
        }
    }

    pub fn from_config(config: &RequestAnalyzerConfig) -> Result<Self, IdentityError> {
        Ok(Self::new(
            StatementClassifier::default(),
            IdentityResolver::from_config(config)?,
            config.max_body_size,
        ))
    }

    /// Analyze `request`. Its body is consumed and replaced with an
    /// equivalent one, so the request can be forwarded afterwards.
    pub async fn analyze(&self, request: &mut Request<Body>) -> ProcessedRequest {
        let defaults = session_defaults(request.headers());

        let body = match read_restorable(request.body_mut(), self.max_body_size).await {
            BodyRead::Complete(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            BodyRead::TooLarge { limit } => {
                tracing::warn!(limit, uri = %request.uri(), "Request body exceeds limit; not classified");
                String::new()
            }
            BodyRead::Unreadable(error) => {
                tracing::warn!(error = %error, uri = %request.uri(), "Request body could not be read");
                String::new()
            }
        };

        let classification = if body.is_empty() {
            Classification::default()
        } else {
            self.classifier.classify(&body, &defaults)
        };

        let user = match self.identity.resolve(request.headers()).await {
            Some(identity) => {
                tracing::debug!(source = ?identity.source, "Resolved request user");
                Some(identity.user)
            }
            None => None,
        };

        ProcessedRequest::new(body, classification, defaults, user)
    }
}

fn session_defaults(headers: &HeaderMap) -> SessionDefaults {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    SessionDefaults::from_headers(header(CATALOG), header(SCHEMA))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyzer(max_body_size: usize) -> RequestAnalyzer {
        RequestAnalyzer::new(
            StatementClassifier::default(),
            IdentityResolver::new("email"),
            max_body_size,
        )
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_analyze_select() {
        let mut request = Request::post("/v1/statement")
            .header("X-Trino-Catalog", "hive")
            .header("X-Trino-Schema", "web")
            .header("X-Trino-User", "alice")
            .body(Body::from("SELECT * FROM events"))
            .unwrap();

        let processed = analyzer(1_000).analyze(&mut request).await;

        assert_eq!(processed.body, "SELECT * FROM events");
        assert_eq!(processed.query_type.as_deref(), Some("Query"));
        assert_eq!(processed.default_catalog, "hive");
        assert_eq!(processed.default_schema, "web");
        assert_eq!(processed.catalogs, set(&["hive"]));
        assert_eq!(processed.schemas, set(&["web"]));
        assert_eq!(processed.catalog_schemas, set(&["hive.web"]));
        assert_eq!(processed.user.as_deref(), Some("alice"));

        let forwarded = axum::body::to_bytes(std::mem::take(request.body_mut()), usize::MAX)
            .await
            .unwrap();
        assert_eq!(forwarded.as_ref(), b"SELECT * FROM events");
    }

    #[tokio::test]
    async fn test_missing_session_headers_are_unset() {
        let mut request = Request::post("/v1/statement")
            .body(Body::from("SELECT 1"))
            .unwrap();

        let processed = analyzer(1_000).analyze(&mut request).await;
        assert_eq!(processed.default_catalog, "__UNSET__");
        assert_eq!(processed.default_schema, "__UNSET__");
        assert_eq!(processed.user, None);
    }

    #[tokio::test]
    async fn test_oversized_body_is_not_classified() {
        let sql = "SELECT * FROM hive.web.events";
        let mut request = Request::post("/v1/statement").body(Body::from(sql)).unwrap();

        let processed = analyzer(8).analyze(&mut request).await;
        assert_eq!(processed.query_type, None);
        assert!(processed.tables.is_empty());
        assert!(processed.catalogs.is_empty());

        let forwarded = axum::body::to_bytes(std::mem::take(request.body_mut()), usize::MAX)
            .await
            .unwrap();
        assert_eq!(forwarded.as_ref(), sql.as_bytes());
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let mut request = Request::post("/v1/statement")
            .body(Body::from("hello there"))
            .unwrap();

        let processed = analyzer(1_000).analyze(&mut request).await;
        assert_eq!(processed.body, "hello there");
        assert_eq!(processed.query_type, None);
        assert!(processed.schemas.is_empty());
    }
}
