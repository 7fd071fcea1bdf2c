//! `sluice check` command implementation.
//!
//! Loads a rule file exactly as the gateway would and prints the rules in
//! the order they fire.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use sluice_router::rules::{Action, RuleSet};
use sluice_router::{FileRuleSource, RuleSource};
use std::path::Path;

pub async fn run(rules_path: &Path) -> Result<()> {
    let set = load(rules_path).await?;

    println!("🔍 {}", rules_path.display());
    if let Some(modified) = set.loaded_at() {
        let modified: DateTime<Local> = modified.into();
        println!("   modified {}", modified.format("%Y-%m-%d %H:%M:%S %Z"));
    }
    println!();

    if set.is_empty() {
        println!("⚠️  No rules defined; every request falls back to the routing group header.");
        return Ok(());
    }

    println!("{:<12} {:<32} {}", "PRIORITY", "NAME", "ROUTES TO");
    println!("{}", "─".repeat(60));
    for rule in set.rules() {
        println!(
            "{:<12} {:<32} {}",
            rule.priority,
            rule.name,
            route_targets(&rule.actions)
        );
        if let Some(description) = &rule.description {
            println!("{:<12} {}", "", description);
        }
    }
    println!();
    println!("✅ {} rule(s) loaded", set.len());
    Ok(())
}

/// Read and parse `path`, stamping the set with the file's modification time.
pub async fn load(path: &Path) -> Result<RuleSet> {
    let source = FileRuleSource::new(path);
    let modified = source
        .modified()
        .await
        .with_context(|| format!("cannot stat {}", path.display()))?;
    let rules = source
        .load()
        .await
        .with_context(|| format!("invalid rule file {}", path.display()))?;
    Ok(RuleSet::new(rules, Some(modified)))
}

fn route_targets(actions: &[Action]) -> String {
    let targets: Vec<String> = actions
        .iter()
        .map(|action| match action {
            Action::RouteTo(group) => group.clone(),
            Action::Set { key, value } => format!("{key}={value}"),
        })
        .collect();
    if targets.is_empty() {
        "-".to_string()
    } else {
        targets.join(", ")
    }
}
