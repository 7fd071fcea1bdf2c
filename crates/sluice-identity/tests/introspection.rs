//! HTTP token introspection against a local token-info endpoint.

use axum::extract::Query;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use sluice_core::IntrospectionConfig;
use sluice_identity::{HttpTokenIntrospector, IdentityResolver, IdentitySource, TokenIntrospector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

async fn tokeninfo(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    match params.get("access_token").map(String::as_str) {
        Some("good-token") => (StatusCode::OK, Json(json!({"email": "ivy@example.com"}))),
        Some("slow-token") => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            (StatusCode::OK, Json(json!({"email": "late@example.com"})))
        }
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_token"})),
        ),
    }
}

async fn serve() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/tokeninfo", get(tokeninfo));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/tokeninfo")
}

fn config(endpoint: String, timeout: Duration) -> IntrospectionConfig {
    IntrospectionConfig {
        endpoint,
        token_param: "access_token".to_string(),
        timeout,
    }
}

#[tokio::test]
async fn test_introspection_returns_claims() {
    let endpoint = serve().await;
    let introspector = HttpTokenIntrospector::new(&config(endpoint, Duration::from_secs(5))).unwrap();

    let claims = introspector.introspect("good-token").await.unwrap();
    assert_eq!(claims["email"], "ivy@example.com");
}

#[tokio::test]
async fn test_rejected_token_is_error() {
    let endpoint = serve().await;
    let introspector = HttpTokenIntrospector::new(&config(endpoint, Duration::from_secs(5))).unwrap();

    assert!(introspector.introspect("bad-token").await.is_err());
}

#[tokio::test]
async fn test_timeout_degrades_to_no_user() {
    let endpoint = serve().await;
    let introspector =
        HttpTokenIntrospector::new(&config(endpoint, Duration::from_millis(200))).unwrap();
    let resolver = IdentityResolver::new("email").with_introspector(Arc::new(introspector));

    let mut headers = HeaderMap::new();
    headers.insert("authorization", HeaderValue::from_static("Bearer slow-token"));
    assert_eq!(resolver.resolve(&headers).await, None);
}

#[tokio::test]
async fn test_resolver_uses_http_introspection() {
    let endpoint = serve().await;
    let introspector = HttpTokenIntrospector::new(&config(endpoint, Duration::from_secs(5))).unwrap();
    let resolver = IdentityResolver::new("email").with_introspector(Arc::new(introspector));

    let mut headers = HeaderMap::new();
    headers.insert("authorization", HeaderValue::from_static("Bearer good-token"));
    let identity = resolver.resolve(&headers).await.unwrap();
    assert_eq!(identity.user, "ivy@example.com");
    assert_eq!(identity.source, IdentitySource::Introspection);
}
