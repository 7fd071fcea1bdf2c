//! Routing rules: definition format, sources and the hot-reloading store.
//!
//! A rule file is a stream of YAML documents, one rule per document:
//!
//! ```yaml
//! name: airflow
//! description: Scheduled pipelines go to the ETL cluster
//! priority: 10
//! condition:
//!   header:
//!     name: X-Trino-Source
//!     starts_with: airflow
//! actions:
//!   - route_to: etl
//! ---
//! name: metadata
//! condition:
//!   query_type:
//!     one_of: [ShowTables, ShowSchemas, ShowColumns]
//! actions:
//!   - route_to: adhoc
//! ```
//!
//! Every rule whose condition holds fires, in ascending `priority` then
//! `name` order. When several rules write the routing group the last one wins.

pub mod rule;
pub mod source;
pub mod store;

pub use rule::{Action, Condition, HeaderCondition, Matcher, Pattern, Rule, RuleSet};
pub use source::{FileRuleSource, RuleSource, parse_rules};
pub use store::RuleStore;
