//! Header and cookie names understood by the gateway.
//!
//! These must match the query engine's client protocol exactly.

/// Catalog used for unqualified table references.
pub const CATALOG: &str = "X-Trino-Catalog";

/// Schema used for unqualified table references.
pub const SCHEMA: &str = "X-Trino-Schema";

/// Explicit user identity set by the client.
pub const USER: &str = "X-Trino-User";

/// Routing group requested by the client.
pub const ROUTING_GROUP: &str = "X-Trino-Routing-Group";

/// Session cookies issued by the engine's web UI and OAuth2 flow.
pub const SESSION_COOKIES: [&str; 2] = ["Trino-UI-Token", "__Secure-Trino-ID-Token"];

/// Placeholder for a catalog or schema header that was not sent.
pub const UNSET: &str = "__UNSET__";

/// Placeholder part in names synthesized for `SHOW` statements.
pub const NONE: &str = "__NONE__";
