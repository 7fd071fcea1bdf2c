//! Error types for identity extraction.

use thiserror::Error;

/// Errors raised while decoding credentials or introspecting tokens.
///
/// These never leave the resolver: a failing source just yields no user.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Credential or token segment is not valid base64.
    #[error("invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not UTF-8.
    #[error("decoded credentials are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Token payload or introspection response is not JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Token does not have the `header.payload.signature` shape.
    #[error("token has {segments} segments, expected 3")]
    NotSignedToken { segments: usize },

    /// Introspection endpoint could not be reached or answered with an error.
    #[error("token introspection failed: {0}")]
    Introspection(#[from] reqwest::Error),
}
