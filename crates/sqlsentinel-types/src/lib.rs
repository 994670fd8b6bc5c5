//! # sqlsentinel-types: Core types for `SQLSentinel`
//!
//! This crate contains the shared vocabulary used across the `SQLSentinel`
//! system:
//! - Risk model ([`RiskLevel`], [`Violation`], [`ValidationResult`])
//! - Statement identity ([`StatementId`], [`SqlKind`], [`ExecutionLayer`])
//! - Pagination classification ([`PaginationKind`], [`RowBounds`])
//! - Bound parameters ([`BoundParameter`], [`BoundValue`])
//! - Enforcement policy ([`ViolationStrategy`], [`BlockedStatementError`])
//! - Audit events ([`AuditEvent`])
//!
//! Everything here is plain data: no parsing, no I/O, no references to the
//! SQL grammar. The engine crate builds on these types; interceptor adapters
//! consume them.

use std::fmt::{self, Display};

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

mod audit;

pub use audit::AuditEvent;

// ============================================================================
// Risk Model
// ============================================================================

/// Severity of a finding, ordered from harmless to destructive.
///
/// Aggregation over a result is `max`: a statement is as risky as its worst
/// violation. `Safe` is reserved for the empty-violation case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    #[default]
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        };
        write!(f, "{name}")
    }
}

/// A single rule finding.
///
/// `rule` is the machine-readable name of the checker that produced the
/// finding; `message` is the user-facing description and `suggestion` the
/// remediation hint surfaced to developers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: String,
    pub risk_level: RiskLevel,
    pub message: String,
    pub suggestion: String,
}

impl Violation {
    pub fn new(
        rule: impl Into<String>,
        risk_level: RiskLevel,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            risk_level,
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (suggestion: {})",
            self.risk_level, self.message, self.suggestion
        )
    }
}

/// Accumulated outcome of running the checker pipeline over one statement.
///
/// The result is threaded through every checker in order. `early_return` is
/// the typed cross-checker signal set by the unconditioned-LIMIT checker to
/// silence the finer pagination checks on the same pass; it never leaves the
/// pipeline in serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    violations: Vec<Violation>,
    #[serde(skip)]
    early_return: bool,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no checker recorded a violation.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Maximum violation severity, or [`RiskLevel::Safe`] when empty.
    pub fn risk_level(&self) -> RiskLevel {
        self.violations
            .iter()
            .map(|v| v.risk_level)
            .max()
            .unwrap_or(RiskLevel::Safe)
    }

    /// Violations in the order checkers recorded them.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Records a finding.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Raises the early-return signal for downstream pagination checkers.
    pub fn set_early_return(&mut self) {
        self.early_return = true;
    }

    /// Whether the early-return signal has been raised on this pass.
    pub fn early_return(&self) -> bool {
        self.early_return
    }

    /// Folds another result into this one, carrying the signal forward.
    pub fn merge(&mut self, other: ValidationResult) {
        self.violations.extend(other.violations);
        self.early_return |= other.early_return;
    }
}

// ============================================================================
// Statement Identity
// ============================================================================

/// Command kind of a SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SqlKind {
    Select,
    Insert,
    Update,
    Delete,
    Unknown,
}

impl SqlKind {
    /// Infers the command kind from the first keyword of the statement.
    ///
    /// The match is a case-insensitive prefix check, which is all an
    /// interceptor can do before parsing. Anything that does not start with
    /// one of the four DML keywords is `Unknown`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use sqlsentinel_types::SqlKind;
    /// assert_eq!(SqlKind::infer("  select * from users"), SqlKind::Select);
    /// assert_eq!(SqlKind::infer("TRUNCATE TABLE users"), SqlKind::Unknown);
    /// ```
    pub fn infer(sql: &str) -> Self {
        let keyword: String = sql
            .trim_start()
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect();
        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" => SqlKind::Select,
            "INSERT" => SqlKind::Insert,
            "UPDATE" => SqlKind::Update,
            "DELETE" => SqlKind::Delete,
            _ => SqlKind::Unknown,
        }
    }
}

impl Display for SqlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlKind::Select => "SELECT",
            SqlKind::Insert => "INSERT",
            SqlKind::Update => "UPDATE",
            SqlKind::Delete => "DELETE",
            SqlKind::Unknown => "UNKNOWN",
        };
        write!(f, "{name}")
    }
}

/// Layer a statement was intercepted at.
///
/// The layer controls which checkers apply and the shape of the
/// [`StatementId`]: mapper-layer ids are `namespace.method`, JDBC-layer ids
/// embed a digest of the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionLayer {
    /// Statement declared in an object-mapper resource (MyBatis-shaped).
    Orm,
    /// Statement observed at the raw JDBC layer (pool filter, proxy, listener).
    Jdbc,
}

/// Stable identifier for the logical call site of a statement.
///
/// The id is opaque to the engine: it only has to be non-empty and stable
/// across calls from the same site, because it keys the deduplication cache
/// and labels audit events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementId(String);

impl StatementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mapper-layer id: `"<namespace>.<method>"`.
    pub fn mapper(namespace: &str, method: &str) -> Self {
        Self(format!("{namespace}.{method}"))
    }

    /// JDBC-layer id: `"jdbc.<interceptor>:<datasource>:<hash>"` where the
    /// hash is the first 8 hex characters of the MD5 digest of the raw SQL.
    /// Distinct SQL texts on the same datasource therefore get distinct ids.
    pub fn jdbc(interceptor: &str, datasource: &str, sql: &str) -> Self {
        Self(format!(
            "jdbc.{interceptor}:{datasource}:{}",
            short_sql_hash(sql)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StatementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for StatementId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// First 8 hex characters of the MD5 digest of `sql`.
fn short_sql_hash(sql: &str) -> String {
    let digest = Md5::digest(sql.as_bytes());
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

// ============================================================================
// Pagination
// ============================================================================

/// How a statement is paginated, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationKind {
    /// Pagination intent was declared (row bounds or a page parameter) but
    /// nothing rewrites the SQL: the driver fetches the full result set and
    /// the framework slices it in memory.
    Logical,
    /// The database performs the slicing, via a LIMIT clause in the SQL or a
    /// registered pagination plugin that will inject one.
    Physical,
    /// No pagination in any form.
    None,
}

/// Row bounds surfaced by the mapper layer alongside a statement.
///
/// The default-infinite sentinel (offset 0, limit `i32::MAX`) is how the
/// mapper says "no bounds"; it must be treated as absence of pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBounds {
    pub offset: u64,
    pub limit: u64,
}

impl RowBounds {
    pub const NO_ROW_OFFSET: u64 = 0;
    pub const NO_ROW_LIMIT: u64 = i32::MAX as u64;

    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// The sentinel meaning "fetch everything".
    pub fn unbounded() -> Self {
        Self {
            offset: Self::NO_ROW_OFFSET,
            limit: Self::NO_ROW_LIMIT,
        }
    }

    /// True for the default-infinite sentinel.
    pub fn is_unbounded(&self) -> bool {
        self.offset == Self::NO_ROW_OFFSET && self.limit >= Self::NO_ROW_LIMIT
    }
}

impl Default for RowBounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

// ============================================================================
// Bound Parameters
// ============================================================================

/// A value bound to a statement parameter, as surfaced by the intercepting
/// layer.
///
/// Page-object recognition is nominal: adapters report the application-level
/// type name, and a name ending in `Page` counts as pagination intent even
/// when the adapter could not extract the numbers. Adapters that can extract
/// them use the `Page` variant so checkers can report concrete offsets.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Opaque application object, identified by its type name only.
    Object { type_name: String },
    /// Page-request object with extracted bounds.
    Page {
        type_name: String,
        offset: u64,
        limit: u64,
    },
}

impl BoundValue {
    /// Whether this value declares pagination intent.
    pub fn is_page_object(&self) -> bool {
        match self {
            BoundValue::Page { .. } => true,
            BoundValue::Object { type_name } => type_name.ends_with("Page"),
            _ => false,
        }
    }

    /// `(offset, limit)` when the adapter extracted them.
    pub fn page_bounds(&self) -> Option<(u64, u64)> {
        match self {
            BoundValue::Page { offset, limit, .. } => Some((*offset, *limit)),
            _ => None,
        }
    }
}

/// An ordered or named bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: Option<String>,
    pub value: BoundValue,
}

impl BoundParameter {
    pub fn positional(value: BoundValue) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: BoundValue) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

// ============================================================================
// Enforcement Policy
// ============================================================================

/// What an interceptor does with a failed validation.
///
/// All three strategies log; they differ in level and in whether execution
/// is allowed to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationStrategy {
    /// Refuse execution with a [`BlockedStatementError`].
    Block,
    /// Log the full violation list at ERROR level, allow execution.
    #[default]
    Warn,
    /// Log at WARN level, allow execution.
    Log,
}

impl ViolationStrategy {
    /// True only for [`ViolationStrategy::Block`].
    pub fn should_block(&self) -> bool {
        matches!(self, ViolationStrategy::Block)
    }

    /// Applies the strategy to a finished validation.
    ///
    /// A passed result is a no-op regardless of strategy. For failed results
    /// the violation list is logged, and under `Block` a typed error is
    /// returned for the host framework to map to a SQL error.
    pub fn enforce(
        &self,
        statement_id: &StatementId,
        result: &ValidationResult,
    ) -> Result<(), BlockedStatementError> {
        if result.passed() {
            return Ok(());
        }

        match self {
            ViolationStrategy::Block => {
                error!(
                    statement_id = %statement_id,
                    risk = %result.risk_level(),
                    violations = result.violations().len(),
                    "blocking SQL statement"
                );
                Err(BlockedStatementError::new(statement_id, result))
            }
            ViolationStrategy::Warn => {
                error!(
                    statement_id = %statement_id,
                    risk = %result.risk_level(),
                    detail = %format_violations(result),
                    "risky SQL statement allowed to execute"
                );
                Ok(())
            }
            ViolationStrategy::Log => {
                warn!(
                    statement_id = %statement_id,
                    risk = %result.risk_level(),
                    detail = %format_violations(result),
                    "risky SQL statement allowed to execute"
                );
                Ok(())
            }
        }
    }
}

/// Error raised under the `Block` strategy.
///
/// Carries SQLSTATE 42000 so JDBC-facing adapters can surface it as a
/// syntax-or-access-rule violation, and a message listing every finding with
/// its risk level and remediation hint.
#[derive(Debug, Clone, Error)]
#[error("SQL statement {statement_id} blocked (SQLSTATE {sqlstate}): {detail}")]
pub struct BlockedStatementError {
    pub statement_id: StatementId,
    pub sqlstate: &'static str,
    pub detail: String,
}

impl BlockedStatementError {
    /// SQLSTATE class 42: syntax error or access rule violation.
    pub const SQLSTATE: &'static str = "42000";

    pub fn new(statement_id: &StatementId, result: &ValidationResult) -> Self {
        Self {
            statement_id: statement_id.clone(),
            sqlstate: Self::SQLSTATE,
            detail: format_violations(result),
        }
    }
}

/// One line per violation, each with risk level and suggestion.
fn format_violations(result: &ValidationResult) -> String {
    result
        .violations()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Safe < RiskLevel::Low);
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test_case("SELECT 1", SqlKind::Select)]
    #[test_case("  \n\tselect id from t", SqlKind::Select)]
    #[test_case("InSeRt into t values (1)", SqlKind::Insert)]
    #[test_case("UPDATE t SET a = 1", SqlKind::Update)]
    #[test_case("delete from t", SqlKind::Delete)]
    #[test_case("TRUNCATE TABLE t", SqlKind::Unknown)]
    #[test_case("", SqlKind::Unknown)]
    fn infers_sql_kind_from_prefix(sql: &str, expected: SqlKind) {
        assert_eq!(SqlKind::infer(sql), expected);
    }

    #[test]
    fn result_aggregates_max_risk() {
        let mut result = ValidationResult::new();
        assert!(result.passed());
        assert_eq!(result.risk_level(), RiskLevel::Safe);

        result.push(Violation::new("a", RiskLevel::Low, "m", "s"));
        result.push(Violation::new("b", RiskLevel::Critical, "m", "s"));
        result.push(Violation::new("c", RiskLevel::Medium, "m", "s"));

        assert!(!result.passed());
        assert_eq!(result.risk_level(), RiskLevel::Critical);
        assert_eq!(result.violations().len(), 3);
    }

    #[test]
    fn merge_carries_violations_and_signal() {
        let mut base = ValidationResult::new();
        base.push(Violation::new("a", RiskLevel::Low, "m", "s"));

        let mut other = ValidationResult::new();
        other.push(Violation::new("b", RiskLevel::High, "m", "s"));
        other.set_early_return();

        base.merge(other);
        assert_eq!(base.violations().len(), 2);
        assert!(base.early_return());
        assert_eq!(base.risk_level(), RiskLevel::High);
    }

    #[test]
    fn mapper_statement_id_format() {
        let id = StatementId::mapper("com.example.UserMapper", "selectById");
        assert_eq!(id.as_str(), "com.example.UserMapper.selectById");
    }

    #[test]
    fn jdbc_statement_id_embeds_short_md5() {
        // MD5("") = d41d8cd98f00b204e9800998ecf8427e
        let id = StatementId::jdbc("druid", "primary", "");
        assert_eq!(id.as_str(), "jdbc.druid:primary:d41d8cd9");
    }

    #[test]
    fn jdbc_statement_id_is_stable_and_sql_sensitive() {
        let a = StatementId::jdbc("hikari", "ds", "SELECT * FROM users");
        let b = StatementId::jdbc("hikari", "ds", "SELECT * FROM users");
        let c = StatementId::jdbc("hikari", "ds", "SELECT * FROM orders");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn row_bounds_sentinel_is_unbounded() {
        assert!(RowBounds::unbounded().is_unbounded());
        assert!(RowBounds::default().is_unbounded());
        assert!(!RowBounds::new(0, 20).is_unbounded());
        assert!(!RowBounds::new(100, 20).is_unbounded());
    }

    #[test]
    fn page_object_recognition_is_nominal() {
        let page = BoundValue::Page {
            type_name: "com.example.PageRequest".to_string(),
            offset: 0,
            limit: 10,
        };
        let named = BoundValue::Object {
            type_name: "com.baomidou.mybatisplus.extension.plugins.pagination.Page".to_string(),
        };
        let plain = BoundValue::Object {
            type_name: "com.example.UserQuery".to_string(),
        };

        assert!(page.is_page_object());
        assert_eq!(page.page_bounds(), Some((0, 10)));
        assert!(named.is_page_object());
        assert_eq!(named.page_bounds(), None);
        assert!(!plain.is_page_object());
        assert!(!BoundValue::Int(7).is_page_object());
    }

    #[test]
    fn only_block_blocks() {
        assert!(ViolationStrategy::Block.should_block());
        assert!(!ViolationStrategy::Warn.should_block());
        assert!(!ViolationStrategy::Log.should_block());
    }

    #[test]
    fn enforce_passes_clean_results() {
        let id = StatementId::mapper("ns", "m");
        let result = ValidationResult::new();
        assert!(ViolationStrategy::Block.enforce(&id, &result).is_ok());
    }

    #[test]
    fn blocked_error_lists_every_violation() {
        let id = StatementId::mapper("ns", "deleteAll");
        let mut result = ValidationResult::new();
        result.push(Violation::new(
            "no-where-clause",
            RiskLevel::Critical,
            "DELETE without WHERE affects the whole table",
            "add a WHERE clause",
        ));
        result.push(Violation::new(
            "dummy-condition",
            RiskLevel::High,
            "tautological WHERE",
            "replace 1=1 with a real predicate",
        ));

        let err = ViolationStrategy::Block.enforce(&id, &result).unwrap_err();
        assert_eq!(err.sqlstate, "42000");
        let text = err.to_string();
        assert!(text.contains("42000"));
        assert!(text.contains("CRITICAL"));
        assert!(text.contains("add a WHERE clause"));
        assert!(text.contains("replace 1=1 with a real predicate"));
    }
}
