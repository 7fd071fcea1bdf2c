//! SQL parsing and name extraction.

use crate::error::SqlError;
use crate::name::QualifiedName;
use sluice_core::headers::NONE;
use sqlparser::ast::{
    Expr, ObjectName, ObjectNamePart, ObjectType, Query, Statement, TableFactor, Visit, Visitor,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::collections::BTreeSet;
use std::ops::ControlFlow;

/// Default number of AST nodes visited before a walk is cut short.
pub const DEFAULT_NODE_BUDGET: usize = 100_000;

/// Parses statements and extracts the object names they reference.
#[derive(Debug)]
pub struct SqlAnalyzer {
    dialect: GenericDialect,
    node_budget: usize,
}

impl Clone for SqlAnalyzer {
    fn clone(&self) -> Self {
        Self {
            dialect: GenericDialect {},
            node_budget: self.node_budget,
        }
    }
}

impl Default for SqlAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlAnalyzer {
    /// Create a new SQL analyzer.
    pub fn new() -> Self {
        Self {
            dialect: GenericDialect {},
            node_budget: DEFAULT_NODE_BUDGET,
        }
    }

    /// Limit how many AST nodes a single walk may visit.
    pub fn with_node_budget(mut self, node_budget: usize) -> Self {
        self.node_budget = node_budget;
        self
    }

    /// Parse text that must contain exactly one statement.
    pub fn parse_statement(&self, sql: &str) -> Result<Statement, SqlError> {
        let mut statements = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| SqlError::ParseError(e.to_string()))?;

        match statements.len() {
            0 => Err(SqlError::EmptyStatement),
            1 => Ok(statements.remove(0)),
            count => Err(SqlError::MultipleStatements { count }),
        }
    }

    /// The statement's syntactic category, e.g. `Query` or `ShowTables`.
    pub fn query_type(&self, stmt: &Statement) -> String {
        let kind = match stmt {
            Statement::Query(_) => "Query",
            Statement::Insert { .. } => "Insert",
            Statement::Update { .. } => "Update",
            Statement::Delete { .. } => "Delete",
            Statement::Merge { .. } => "Merge",
            Statement::Truncate { .. } => "TruncateTable",
            Statement::CreateTable(create) if create.query.is_some() => "CreateTableAsSelect",
            Statement::CreateTable { .. } => "CreateTable",
            Statement::CreateView { .. } => "CreateView",
            Statement::CreateSchema { .. } => "CreateSchema",
            Statement::AlterTable { .. } => "AlterTable",
            Statement::Drop { object_type, .. } => match object_type {
                ObjectType::Table => "DropTable",
                ObjectType::View => "DropView",
                ObjectType::MaterializedView => "DropMaterializedView",
                ObjectType::Schema => "DropSchema",
                _ => "Drop",
            },
            Statement::ShowTables { .. } => "ShowTables",
            Statement::ShowColumns { .. } => "ShowColumns",
            Statement::ShowSchemas { .. } => "ShowSchemas",
            Statement::ShowViews { .. } => "ShowViews",
            Statement::ShowFunctions { .. } => "ShowFunctions",
            Statement::ShowCreate { .. } => "ShowCreate",
            // DESCRIBE <table> is the engine's shorthand for SHOW COLUMNS.
            Statement::ExplainTable { .. } => "ShowColumns",
            Statement::Explain { .. } => "Explain",
            Statement::Use { .. } => "Use",
            Statement::Analyze { .. } => "Analyze",
            Statement::Call { .. } => "Call",
            Statement::Prepare { .. } => "Prepare",
            Statement::Execute { .. } => "Execute",
            Statement::Deallocate { .. } => "Deallocate",
            Statement::StartTransaction { .. } => "StartTransaction",
            Statement::Commit { .. } => "Commit",
            Statement::Rollback { .. } => "Rollback",
            Statement::Grant { .. } => "Grant",
            Statement::Revoke { .. } => "Revoke",
            _ => "Other",
        };
        kind.to_string()
    }

    /// Collect every table-like name referenced by a statement.
    ///
    /// `default_catalog` qualifies the schema of a `SHOW TABLES FROM <schema>`
    /// that names only the schema.
    pub fn collect_names(&self, stmt: &Statement, default_catalog: &str) -> NameCollection {
        let mut collector = NameCollector {
            default_catalog,
            names: BTreeSet::new(),
            show_depth: 0,
            visited: 0,
            budget: self.node_budget,
        };
        let truncated = stmt.visit(&mut collector).is_break();

        NameCollection {
            names: collector.names,
            visited: collector.visited,
            truncated,
        }
    }
}

/// Names found in a statement.
#[derive(Debug, Clone, Default)]
pub struct NameCollection {
    /// Distinct names, in sorted order.
    pub names: BTreeSet<QualifiedName>,
    /// Number of AST nodes visited.
    pub visited: usize,
    /// The walk stopped early because the node budget ran out.
    pub truncated: bool,
}

struct NameCollector<'a> {
    default_catalog: &'a str,
    names: BTreeSet<QualifiedName>,
    // Relations nested inside a SHOW statement are its own FROM clause and are
    // represented by the synthesized name instead.
    show_depth: usize,
    visited: usize,
    budget: usize,
}

impl NameCollector<'_> {
    fn tick(&mut self) -> ControlFlow<()> {
        self.visited += 1;
        if self.visited > self.budget {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn show_reference(&self, stmt: &Statement) -> Option<QualifiedName> {
        match stmt {
            Statement::ShowColumns { show_options, .. } => show_options
                .show_in
                .as_ref()
                .and_then(|show_in| show_in.parent_name.as_ref())
                .and_then(qualified_name),
            Statement::ExplainTable { table_name, .. } => qualified_name(table_name),
            Statement::ShowSchemas { show_options, .. } => {
                let catalog = show_options
                    .show_in
                    .as_ref()
                    .and_then(|show_in| show_in.parent_name.as_ref())
                    .and_then(qualified_name)
                    .and_then(|name| name.parts().last().cloned())
                    .unwrap_or_else(|| NONE.to_string());
                Some(QualifiedName::of(catalog, NONE, NONE))
            }
            Statement::ShowTables { show_options, .. } => {
                let schema = show_options
                    .show_in
                    .as_ref()
                    .and_then(|show_in| show_in.parent_name.as_ref())
                    .and_then(qualified_name)?;
                let (catalog, schema) = match schema.parts() {
                    [schema] => (self.default_catalog.to_string(), schema.clone()),
                    [.., catalog, schema] => (catalog.clone(), schema.clone()),
                    [] => return None,
                };
                Some(QualifiedName::of(catalog, schema, NONE))
            }
            _ => None,
        }
    }
}

impl Visitor for NameCollector<'_> {
    type Break = ();

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<Self::Break> {
        self.tick()?;
        if let Some(name) = self.show_reference(statement) {
            self.names.insert(name);
        }
        if is_show(statement) {
            self.show_depth += 1;
        }
        ControlFlow::Continue(())
    }

    fn post_visit_statement(&mut self, statement: &Statement) -> ControlFlow<Self::Break> {
        if is_show(statement) {
            self.show_depth = self.show_depth.saturating_sub(1);
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        self.tick()?;
        if self.show_depth == 0 {
            if let Some(name) = qualified_name(relation) {
                self.names.insert(name);
            }
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.tick()
    }

    fn pre_visit_table_factor(&mut self, _table_factor: &TableFactor) -> ControlFlow<Self::Break> {
        self.tick()
    }

    fn pre_visit_expr(&mut self, _expr: &Expr) -> ControlFlow<Self::Break> {
        self.tick()
    }
}

fn is_show(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::ShowColumns { .. }
            | Statement::ShowSchemas { .. }
            | Statement::ShowTables { .. }
            | Statement::ExplainTable { .. }
    )
}

fn qualified_name(name: &ObjectName) -> Option<QualifiedName> {
    QualifiedName::new(name.0.iter().map(|part| match part {
        ObjectNamePart::Identifier(ident) => ident.value.to_lowercase(),
        #[allow(unreachable_patterns)]
        other => other.to_string().to_lowercase(),
    }))
}
