//! # sluice-router
//!
//! Chooses the routing group for an inbound query request.
//!
//! Two selectors are available, picked at configuration time:
//!
//! - [`HeaderRoutingGroupSelector`] returns the client's
//!   `X-Trino-Routing-Group` header.
//! - [`RulesEngineRoutingGroupSelector`] classifies the request body, resolves
//!   the user and fires the routing rules from a hot-reloaded rule file.
//!
//! The rule engine path never fails outward: reload or evaluation problems
//! are logged and the header value is used for that request.
//!
//! ```text
//! request ──► RuleStore::ensure_fresh ──► RequestAnalyzer::analyze ──► decide
//!                 │ (reload on mtime change)     │ (body restored)        │
//!                 └──────────── error ──► header fallback ◄── undecided ──┘
//! ```

pub mod body;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod processed;
pub mod rules;
pub mod selector;

pub use engine::{Evaluation, Facts, ROUTING_GROUP_KEY, decide, evaluate};
pub use error::{RuleError, SetupError};
pub use middleware::{RoutingDecision, assign_routing_group};
pub use processed::{ProcessedRequest, RequestAnalyzer};
pub use rules::{FileRuleSource, Rule, RuleSet, RuleSource, RuleStore};
pub use selector::{
    Explanation, HeaderRoutingGroupSelector, RoutingGroupSelector, RulesEngineRoutingGroupSelector,
    from_config,
};
