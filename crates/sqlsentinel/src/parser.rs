//! SQL parser facade.
//!
//! Wraps `sqlparser` with the generic dialect and a construction-time error
//! mode. The facade does exactly one thing: turn text into an AST. It keeps
//! no cache and does no inspection; those belong to the validator and the
//! checkers.

use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use tracing::warn;

use sqlsentinel_config::ParserMode;

use crate::error::SqlParseError;

/// Parses raw SQL into a [`Statement`], fail-fast or leniently.
///
/// The mode governs only grammar errors. Anything else that goes wrong
/// propagates regardless of mode.
#[derive(Debug, Clone, Copy)]
pub struct StatementParser {
    mode: ParserMode,
}

impl StatementParser {
    pub fn new(mode: ParserMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ParserMode {
        self.mode
    }

    /// Parses `sql`, returning:
    /// - `Ok(Some(statement))` on success (first statement of the input),
    /// - `Ok(None)` in lenient mode when the text is ungrammatical; the
    ///   caller should skip validation with a pass,
    /// - `Err` in fail-fast mode when the text is ungrammatical.
    pub fn parse(&self, sql: &str) -> Result<Option<Statement>, SqlParseError> {
        match Self::parse_statement(sql) {
            Ok(statement) => Ok(Some(statement)),
            Err(err) => match self.mode {
                ParserMode::FailFast => Err(err),
                ParserMode::Lenient => {
                    warn!(error = %err, "skipping validation for unparseable SQL");
                    Ok(None)
                }
            },
        }
    }

    fn parse_statement(sql: &str) -> Result<Statement, SqlParseError> {
        let dialect = GenericDialect {};
        let mut statements = Parser::parse_sql(&dialect, sql)?;
        if statements.is_empty() {
            return Err(SqlParseError::Empty);
        }
        // Interceptors hand over one statement at a time; if a batch slips
        // through, the first statement is the one about to execute.
        Ok(statements.remove(0))
    }
}
