//! Identity resolution chain.

use crate::cookies;
use crate::error::IdentityError;
use crate::introspect::{HttpTokenIntrospector, TokenIntrospector};
use crate::token;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use serde::Serialize;
use sluice_core::RequestAnalyzerConfig;
use sluice_core::headers::{SESSION_COOKIES, USER};
use std::sync::Arc;

/// Where a resolved user name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    UserHeader,
    BasicAuth,
    BearerToken,
    Introspection,
    SessionCookie,
}

/// A user name and the credential it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user: String,
    pub source: IdentitySource,
}

impl Identity {
    fn new(user: impl Into<String>, source: IdentitySource) -> Self {
        Self {
            user: user.into(),
            source,
        }
    }
}

/// Works out the requesting user from headers and cookies.
///
/// Resolution never fails: every decode or lookup error is logged and treated
/// as "this source has no user".
#[derive(Clone)]
pub struct IdentityResolver {
    user_field: String,
    introspector: Option<Arc<dyn TokenIntrospector>>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("user_field", &self.user_field)
            .field("introspection", &self.introspector.is_some())
            .finish()
    }
}

impl IdentityResolver {
    /// Resolver reading `user_field` from token claims, without introspection.
    pub fn new(user_field: impl Into<String>) -> Self {
        Self {
            user_field: user_field.into(),
            introspector: None,
        }
    }

    /// Resolve opaque bearer tokens through `introspector`.
    pub fn with_introspector(mut self, introspector: Arc<dyn TokenIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// Build from configuration, wiring the HTTP introspector when an
    /// endpoint is configured.
    pub fn from_config(config: &RequestAnalyzerConfig) -> Result<Self, IdentityError> {
        let resolver = Self::new(config.token_user_field.clone());
        match &config.introspection {
            Some(introspection) => {
                let client = HttpTokenIntrospector::new(introspection)?;
                tracing::debug!(endpoint = %client.endpoint(), "Token introspection enabled");
                Ok(resolver.with_introspector(Arc::new(client)))
            }
            None => Ok(resolver),
        }
    }

    pub fn user_field(&self) -> &str {
        &self.user_field
    }

    /// Resolve the user, trying each source in priority order.
    pub async fn resolve(&self, headers: &HeaderMap) -> Option<Identity> {
        // A present user header is taken verbatim, even when empty.
        if let Some(user) = headers.get(USER) {
            let user = String::from_utf8_lossy(user.as_bytes());
            return Some(Identity::new(user, IdentitySource::UserHeader));
        }

        if let Some(identity) = self.from_authorization(headers).await {
            return Some(identity);
        }

        self.from_cookies(headers)
    }

    async fn from_authorization(&self, headers: &HeaderMap) -> Option<Identity> {
        let value = header_str(headers, AUTHORIZATION.as_str())?;
        let (scheme, credentials) = value.split_once(' ')?;
        let credentials = credentials.trim();

        if scheme.eq_ignore_ascii_case("basic") {
            match basic_user(credentials) {
                Ok(user) => user.map(|u| Identity::new(u, IdentitySource::BasicAuth)),
                Err(e) => {
                    tracing::debug!(error = %e, "Could not decode basic credentials");
                    None
                }
            }
        } else if scheme.eq_ignore_ascii_case("bearer") {
            self.from_bearer(credentials).await
        } else {
            tracing::debug!(scheme, "Unsupported authorization scheme");
            None
        }
    }

    async fn from_bearer(&self, token: &str) -> Option<Identity> {
        if token::is_signed_token(token) {
            return self
                .claim_from_signed(token)
                .map(|user| Identity::new(user, IdentitySource::BearerToken));
        }

        let introspector = self.introspector.as_ref()?;
        match introspector.introspect(token).await {
            Ok(claims) => token::claim(&claims, &self.user_field)
                .map(|user| Identity::new(user, IdentitySource::Introspection)),
            Err(e) => {
                tracing::warn!(error = %e, "Token introspection failed");
                None
            }
        }
    }

    fn from_cookies(&self, headers: &HeaderMap) -> Option<Identity> {
        cookies::values_named(headers, &SESSION_COOKIES)
            .filter(|value| token::is_signed_token(value))
            .find_map(|value| self.claim_from_signed(value))
            .map(|user| Identity::new(user, IdentitySource::SessionCookie))
    }

    fn claim_from_signed(&self, token: &str) -> Option<String> {
        match token::signed_token_payload(token) {
            Ok(payload) => token::claim(&payload, &self.user_field),
            Err(e) => {
                tracing::warn!(error = %e, "Could not decode token payload");
                None
            }
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

// `user:password`; the user is everything before the first colon.
fn basic_user(credentials: &str) -> Result<Option<String>, IdentityError> {
    let decoded = String::from_utf8(STANDARD.decode(credentials)?)?;
    let user = decoded.split_once(':').map_or(decoded.as_str(), |(u, _)| u);
    Ok((!user.is_empty()).then(|| user.to_string()))
}
