//! Error types for rule loading and selector setup.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while reading or reloading routing rules.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Rule file could not be read or its timestamp queried.
    #[error("failed to access rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A YAML document is malformed or does not describe a rule.
    #[error("invalid rule in document {document}: {source}")]
    Yaml {
        document: usize,
        #[source]
        source: serde_yaml::Error,
    },

    /// Two rules share a name.
    #[error("duplicate rule name '{0}'")]
    DuplicateName(String),

    /// A reload attempt failed. Callers that waited on the same attempt share
    /// its error.
    #[error("rule reload failed: {0}")]
    ReloadFailed(Arc<RuleError>),
}

impl RuleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while building a selector from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Routing rules are enabled without a rule file.
    #[error("routing_rules.rules_file is required when routing rules are enabled")]
    MissingRulesFile,

    /// The identity resolver could not be built.
    #[error(transparent)]
    Identity(#[from] sluice_identity::IdentityError),
}
