//! Engine error types.

use thiserror::Error;

/// Raised when SQL text cannot be turned into an AST.
///
/// Under the lenient parser mode this error never reaches callers: the
/// facade swallows it, logs a warning and hands back `Ok(None)`, which the
/// validator then turns into a pass. Under fail-fast mode it propagates
/// unchanged.
#[derive(Debug, Error)]
pub enum SqlParseError {
    /// The text does not parse under the generic SQL dialect.
    #[error("SQL syntax error: {0}")]
    Syntax(#[from] sqlparser::parser::ParserError),

    /// The input contained no statement at all.
    #[error("empty SQL statement")]
    Empty,
}
