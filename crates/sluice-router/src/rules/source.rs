//! Where rule definitions come from.

use crate::error::RuleError;
use crate::rules::rule::Rule;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Backing definition of a rule set.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Human-readable location, used in logs.
    fn describe(&self) -> String;

    /// Modification time of the definition.
    async fn modified(&self) -> Result<SystemTime, RuleError>;

    /// Read and parse every rule.
    async fn load(&self) -> Result<Vec<Rule>, RuleError>;
}

/// Rules stored in a multi-document YAML file.
#[derive(Debug, Clone)]
pub struct FileRuleSource {
    path: PathBuf,
}

impl FileRuleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RuleSource for FileRuleSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn modified(&self) -> Result<SystemTime, RuleError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| RuleError::io(&self.path, e))?;
        metadata.modified().map_err(|e| RuleError::io(&self.path, e))
    }

    async fn load(&self) -> Result<Vec<Rule>, RuleError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| RuleError::io(&self.path, e))?;
        parse_rules(&text)
    }
}

/// Parse a `---`-separated stream of rule documents.
///
/// Empty documents are skipped, so an empty file is an empty rule set.
pub fn parse_rules(text: &str) -> Result<Vec<Rule>, RuleError> {
    let mut rules = Vec::new();
    let mut names = HashSet::new();

    for (document, de) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let rule = Option::<Rule>::deserialize(de)
            .map_err(|source| RuleError::Yaml { document, source })?;
        let Some(rule) = rule else { continue };

        if !names.insert(rule.name.clone()) {
            return Err(RuleError::DuplicateName(rule.name));
        }
        rules.push(rule);
    }

    Ok(rules)
}
