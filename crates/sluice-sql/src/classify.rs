//! Statement classification.
//!
//! Combines parsing and name extraction with the session defaults to produce
//! the catalog and schema facts that routing rules match on.

use crate::name::QualifiedName;
use crate::parser::SqlAnalyzer;
use serde::Serialize;
use sluice_core::headers::UNSET;
use std::collections::BTreeSet;

/// Catalog and schema used for names that do not spell them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionDefaults {
    pub catalog: String,
    pub schema: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            catalog: UNSET.to_string(),
            schema: UNSET.to_string(),
        }
    }
}

impl SessionDefaults {
    /// Build defaults from optional header values, falling back to `__UNSET__`.
    pub fn from_headers(catalog: Option<&str>, schema: Option<&str>) -> Self {
        Self {
            catalog: catalog.unwrap_or(UNSET).to_string(),
            schema: schema.unwrap_or(UNSET).to_string(),
        }
    }
}

/// Facts derived from one statement.
///
/// All sets are empty when the text did not parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Statement kind, absent when parsing failed.
    pub query_type: Option<String>,
    /// Referenced names, including synthesized `SHOW` names.
    pub tables: BTreeSet<QualifiedName>,
    pub catalogs: BTreeSet<String>,
    pub schemas: BTreeSet<String>,
    pub catalog_schemas: BTreeSet<String>,
}

impl Classification {
    /// Resolve names against the session defaults.
    pub fn derive(
        query_type: Option<String>,
        tables: BTreeSet<QualifiedName>,
        defaults: &SessionDefaults,
    ) -> Self {
        let catalogs = tables.iter().map(|n| catalog_of(n, defaults)).collect();
        let schemas = tables.iter().map(|n| schema_of(n, defaults)).collect();
        let catalog_schemas = tables
            .iter()
            .map(|n| catalog_schema_of(n, defaults))
            .collect();

        Self {
            query_type,
            tables,
            catalogs,
            schemas,
            catalog_schemas,
        }
    }
}

/// Classifies request bodies.
#[derive(Debug, Clone, Default)]
pub struct StatementClassifier {
    analyzer: SqlAnalyzer,
}

impl StatementClassifier {
    pub fn new(analyzer: SqlAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Classify `body`. Text that is not a single valid statement yields an
    /// empty classification.
    pub fn classify(&self, body: &str, defaults: &SessionDefaults) -> Classification {
        let stmt = match self.analyzer.parse_statement(body) {
            Ok(stmt) => stmt,
            Err(e) => {
                tracing::debug!(error = %e, body_len = body.len(), "Request body is not a statement");
                return Classification::default();
            }
        };

        let query_type = self.analyzer.query_type(&stmt);
        let collection = self.analyzer.collect_names(&stmt, &defaults.catalog);
        if collection.truncated {
            tracing::warn!(
                visited = collection.visited,
                query_type = %query_type,
                "Statement walk stopped at node budget; table facts are partial"
            );
        }

        Classification::derive(Some(query_type), collection.names, defaults)
    }
}

fn catalog_of(name: &QualifiedName, defaults: &SessionDefaults) -> String {
    match name.parts() {
        [catalog, _, _] => catalog.clone(),
        _ => defaults.catalog.clone(),
    }
}

// Picks `parts[3 - n]`: the schema of a three-part name, but the object of a
// two-part name. Existing rule files match on this value, so it is kept even
// though `catalog_schema_of` reads the schema from `parts[0]`.
fn schema_of(name: &QualifiedName, defaults: &SessionDefaults) -> String {
    match name.parts() {
        [_, object] => object.clone(),
        [_, schema, _] => schema.clone(),
        _ => defaults.schema.clone(),
    }
}

fn catalog_schema_of(name: &QualifiedName, defaults: &SessionDefaults) -> String {
    match name.parts() {
        [catalog, schema, _] => format!("{catalog}.{schema}"),
        [schema, _] => format!("{}.{schema}", defaults.catalog),
        _ => format!("{}.{}", defaults.catalog, defaults.schema),
    }
}
