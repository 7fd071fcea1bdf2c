//! # sluice-identity
//!
//! Best-effort extraction of the user behind a query request.
//!
//! The gateway does not authenticate anyone; the backend cluster does. This
//! crate only works out *who claims to be asking* so that routing rules can
//! send a user's queries to a dedicated group. Nothing here verifies
//! signatures.
//!
//! ## Extraction Order
//!
//! | Priority | Source | How |
//! |----------|--------|-----|
//! | 1 | `X-Trino-User` header | raw value |
//! | 2 | `Authorization: Basic` | user part of `user:password` |
//! | 2 | `Authorization: Bearer` (signed token) | claim from the payload segment |
//! | 2 | `Authorization: Bearer` (opaque token) | claim from the introspection endpoint |
//! | 3 | session cookies | claim from the payload segment |
//!
//! The first source that yields a value wins. A source that fails to decode
//! simply yields nothing and the next one is tried.

pub mod cookies;
pub mod error;
pub mod introspect;
pub mod resolver;
pub mod token;

pub use error::IdentityError;
pub use introspect::{HttpTokenIntrospector, TokenIntrospector};
pub use resolver::{Identity, IdentityResolver, IdentitySource};
