//! Validation input: the normalized statement context.

use sqlparser::ast::{Expr, Statement};

use sqlsentinel_types::{
    BoundParameter, ExecutionLayer, PaginationKind, RowBounds, SqlKind, StatementId,
};

use crate::ast;
use crate::pagination::PaginationDetector;

/// Everything an interceptor knows about a statement it is about to execute.
///
/// Built once per statement by the intercepting adapter and discarded after
/// validation. The parsed statement is optional; when absent the validator
/// parses the text exactly once and every checker reads the same AST.
#[derive(Debug, Clone)]
pub struct SqlContext {
    /// Raw statement text. Required, non-empty.
    pub sql: String,
    /// Command kind, usually inferred from the first keyword.
    pub kind: SqlKind,
    /// Layer the statement was intercepted at.
    pub layer: ExecutionLayer,
    /// Stable identifier of the logical call site.
    pub statement_id: StatementId,
    /// Pre-parsed AST, when the adapter already has one.
    pub statement: Option<Statement>,
    /// Bound parameters, ordered or named.
    pub parameters: Vec<BoundParameter>,
    /// Row bounds surfaced by the mapper layer.
    pub row_bounds: Option<RowBounds>,
    /// Logical datasource name.
    pub datasource: Option<String>,
}

impl SqlContext {
    pub fn new(
        sql: impl Into<String>,
        kind: SqlKind,
        layer: ExecutionLayer,
        statement_id: StatementId,
    ) -> Self {
        Self {
            sql: sql.into(),
            kind,
            layer,
            statement_id,
            statement: None,
            parameters: Vec::new(),
            row_bounds: None,
            datasource: None,
        }
    }

    /// Builds a context with the kind inferred from the SQL text.
    pub fn inferred(
        sql: impl Into<String>,
        layer: ExecutionLayer,
        statement_id: StatementId,
    ) -> Self {
        let sql = sql.into();
        let kind = SqlKind::infer(&sql);
        Self::new(sql, kind, layer, statement_id)
    }

    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.statement = Some(statement);
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<BoundParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_row_bounds(mut self, row_bounds: RowBounds) -> Self {
        self.row_bounds = Some(row_bounds);
        self
    }

    pub fn with_datasource(mut self, datasource: impl Into<String>) -> Self {
        self.datasource = Some(datasource.into());
        self
    }

    /// Whether the caller declared pagination intent through parameters.
    ///
    /// True when row bounds are present and not the default-infinite
    /// sentinel, or when any bound parameter is a recognized page object.
    pub fn has_page_parameter(&self) -> bool {
        let bounded = self.row_bounds.is_some_and(|bounds| !bounds.is_unbounded());
        bounded
            || self
                .parameters
                .iter()
                .any(|param| param.value.is_page_object())
    }

    /// `(offset, limit)` from the row bounds or the first page parameter,
    /// for reporting.
    pub fn page_bounds_hint(&self) -> Option<(u64, u64)> {
        if let Some(bounds) = self.row_bounds.filter(|bounds| !bounds.is_unbounded()) {
            return Some((bounds.offset, bounds.limit));
        }
        self.parameters
            .iter()
            .find_map(|param| param.value.page_bounds())
    }
}

/// Per-call view handed to every checker: the context, the statement the
/// validator settled on, and the pagination classification for this call.
#[derive(Debug)]
pub struct CheckTarget<'a> {
    pub context: &'a SqlContext,
    pub statement: Option<&'a Statement>,
    pagination: PaginationKind,
}

impl<'a> CheckTarget<'a> {
    /// Classifies pagination once; checkers read the shared answer.
    pub fn new(
        context: &'a SqlContext,
        statement: Option<&'a Statement>,
        detector: &PaginationDetector,
    ) -> Self {
        let pagination = detector.detect(context, statement);
        Self {
            context,
            statement,
            pagination,
        }
    }

    pub fn pagination(&self) -> PaginationKind {
        self.pagination
    }

    /// WHERE expression of the statement, when one exists.
    pub fn where_clause(&self) -> Option<&'a Expr> {
        self.statement.and_then(ast::where_clause)
    }
}
