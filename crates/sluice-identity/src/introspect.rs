//! Opaque token introspection.
//!
//! Bearer tokens that are not signed tokens carry no readable claims, so the
//! resolver asks an identity provider to describe them. The HTTP client
//! follows the token-info convention: `GET <endpoint>?access_token=<token>`
//! answered with a flat JSON object of claims.

use crate::error::IdentityError;
use async_trait::async_trait;
use serde_json::Value;
use sluice_core::IntrospectionConfig;

/// Describes an opaque token as a JSON object of claims.
#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    async fn introspect(&self, token: &str) -> Result<Value, IdentityError>;
}

/// Introspector backed by an HTTP token-info endpoint.
#[derive(Debug, Clone)]
pub struct HttpTokenIntrospector {
    client: reqwest::Client,
    endpoint: String,
    token_param: String,
}

impl HttpTokenIntrospector {
    /// Build a client with the configured request timeout.
    pub fn new(config: &IntrospectionConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token_param: config.token_param.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenIntrospector for HttpTokenIntrospector {
    async fn introspect(&self, token: &str) -> Result<Value, IdentityError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[(self.token_param.as_str(), token)])
            .send()
            .await?
            .error_for_status()?;

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
