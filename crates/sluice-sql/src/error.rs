//! Error types for statement parsing.

use thiserror::Error;

/// Errors that can occur while parsing a request body as a statement.
#[derive(Debug, Error)]
pub enum SqlError {
    /// The text is not valid statement syntax.
    #[error("failed to parse SQL: {0}")]
    ParseError(String),

    /// The body contained no statement at all.
    #[error("request body contains no statement")]
    EmptyStatement,

    /// The body contained more than one statement.
    #[error("expected a single statement, found {count}")]
    MultipleStatements { count: usize },
}
