//! # sluice-sql
//!
//! Statement classification for routing decisions.
//!
//! This crate turns the text of a query request into routing facts:
//! - the statement's kind (`Query`, `ShowTables`, `Insert`, ...)
//! - every table-like name it references, as a [`QualifiedName`]
//! - the catalogs, schemas and `catalog.schema` pairs those names resolve to
//!
//! ## Name Resolution
//!
//! Unqualified names are resolved against the session defaults sent in the
//! `X-Trino-Catalog` / `X-Trino-Schema` headers:
//!
//! | Reference        | catalog     | schema      | catalog_schema          |
//! |------------------|-------------|-------------|-------------------------|
//! | `t`              | default     | default     | `default.default`       |
//! | `s.t`            | default     | `s`         | `default.s`             |
//! | `c.s.t`          | `c`         | `s`         | `c.s`                   |
//!
//! `SHOW` statements contribute synthesized names so that rules can route
//! metadata requests by catalog or schema as well.
//!
//! Text that does not parse is not an error for callers of
//! [`StatementClassifier::classify`]: it yields an empty [`Classification`].

pub mod classify;
pub mod error;
pub mod name;
pub mod parser;

pub use classify::{Classification, SessionDefaults, StatementClassifier};
pub use error::SqlError;
pub use name::QualifiedName;
pub use parser::{NameCollection, SqlAnalyzer};
