//! Audit-event schema.
//!
//! Interceptor adapters emit one event per intercepted statement regardless
//! of the enforcement strategy; the writer that persists them lives outside
//! the engine. The schema is the contract between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SqlKind, StatementId, ValidationResult};

/// One intercepted statement, as recorded for audit.
///
/// `violations` is present only when validation failed; a passed statement
/// is recorded without it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub sql: String,
    pub sql_kind: SqlKind,
    pub statement_id: StatementId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub datasource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub execution_time_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rows_affected: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub violations: Option<ValidationResult>,
}

impl AuditEvent {
    /// Starts an event stamped with the current time.
    pub fn new(sql: impl Into<String>, sql_kind: SqlKind, statement_id: StatementId) -> Self {
        Self {
            timestamp: Utc::now(),
            sql: sql.into(),
            sql_kind,
            statement_id,
            datasource: None,
            execution_time_ms: None,
            rows_affected: None,
            error_message: None,
            violations: None,
        }
    }

    pub fn with_datasource(mut self, datasource: impl Into<String>) -> Self {
        self.datasource = Some(datasource.into());
        self
    }

    pub fn with_execution_time_ms(mut self, millis: i64) -> Self {
        self.execution_time_ms = Some(millis);
        self
    }

    pub fn with_rows_affected(mut self, rows: i32) -> Self {
        self.rows_affected = Some(rows);
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    /// Attaches the validation outcome; passed results are omitted.
    pub fn with_result(mut self, result: &ValidationResult) -> Self {
        self.violations = if result.passed() {
            None
        } else {
            Some(result.clone())
        };
        self
    }
}
