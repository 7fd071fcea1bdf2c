//! Unverified decoding of signed tokens.
//!
//! Only the payload segment is read; signatures are not checked.

use crate::error::IdentityError;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde_json::Value;

/// Decode the JSON payload of a `header.payload.signature` token.
///
/// Tokens with any other number of `.`-separated segments are rejected.
pub fn signed_token_payload(token: &str) -> Result<Value, IdentityError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(IdentityError::NotSignedToken {
            segments: segments.len(),
        });
    };

    let bytes = decode_segment(payload)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Whether a token has the three-segment shape of a signed token.
pub fn is_signed_token(token: &str) -> bool {
    token.split('.').count() == 3
}

/// Read a claim as text. Strings are returned as-is, numbers and booleans are
/// rendered; other JSON types yield nothing.
pub fn claim(payload: &Value, field: &str) -> Option<String> {
    match payload.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Payloads are base64url without padding; some issuers pad or use the
// standard alphabet.
fn decode_segment(segment: &str) -> Result<Vec<u8>, IdentityError> {
    let trimmed = segment.trim_end_matches('=');
    match URL_SAFE_NO_PAD.decode(trimmed) {
        Ok(bytes) => Ok(bytes),
        Err(_) => Ok(STANDARD_NO_PAD.decode(trimmed)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(payload: &Value) -> String {
        format!(
            "eyJhbGciOiJIUzI1NiJ9.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(payload.to_string())
        )
    }

    #[test]
    fn test_payload_decoded() {
        let payload = signed_token_payload(&token(&json!({"email": "alice@example.com"}))).unwrap();
        assert_eq!(claim(&payload, "email").as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_padded_payload_decoded() {
        let payload = json!({"sub": "bob"});
        let padded = format!(
            "h.{}.s",
            base64::engine::general_purpose::URL_SAFE.encode(payload.to_string())
        );
        let decoded = signed_token_payload(&padded).unwrap();
        assert_eq!(claim(&decoded, "sub").as_deref(), Some("bob"));
    }

    #[test]
    fn test_segment_count_uses_literal_dot() {
        assert!(!is_signed_token("abc"));
        assert!(!is_signed_token("a.b"));
        assert!(is_signed_token("a.b.c"));
        assert!(!is_signed_token("a.b.c.d"));
        assert!(matches!(
            signed_token_payload("a.b.c.d"),
            Err(IdentityError::NotSignedToken { segments: 4 })
        ));
    }

    #[test]
    fn test_non_json_payload_is_error() {
        let bad = format!("h.{}.s", URL_SAFE_NO_PAD.encode("not json"));
        assert!(matches!(signed_token_payload(&bad), Err(IdentityError::Json(_))));
    }

    #[test]
    fn test_claim_types() {
        let payload = json!({"s": "x", "n": 42, "b": true, "o": {"k": 1}, "z": null});
        assert_eq!(claim(&payload, "s").as_deref(), Some("x"));
        assert_eq!(claim(&payload, "n").as_deref(), Some("42"));
        assert_eq!(claim(&payload, "b").as_deref(), Some("true"));
        assert_eq!(claim(&payload, "o"), None);
        assert_eq!(claim(&payload, "z"), None);
        assert_eq!(claim(&payload, "missing"), None);
    }
}
