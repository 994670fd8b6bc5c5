//! Paginated queries without a deterministic order.
//!
//! Without ORDER BY, page boundaries are unstable: rows can repeat or go
//! missing between pages. Presence of any ORDER BY is enough; the rule
//! makes no judgment about its quality.

use sqlparser::ast::Statement;

use sqlsentinel_config::MissingOrderByConfig;
use sqlsentinel_types::{PaginationKind, RiskLevel, ValidationResult, Violation};

use crate::ast;
use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct MissingOrderByChecker {
    config: MissingOrderByConfig,
}

impl MissingOrderByChecker {
    pub const NAME: &'static str = "missing-order-by";

    pub fn new(config: MissingOrderByConfig) -> Self {
        Self { config }
    }
}

impl RuleChecker for MissingOrderByChecker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn check(&self, target: &CheckTarget<'_>, result: &mut ValidationResult) {
        if target.pagination() != PaginationKind::Physical || result.early_return() {
            return;
        }
        let Some(statement) = target.statement else {
            return;
        };
        if !matches!(statement, Statement::Query(_)) {
            return;
        }
        if ast::has_order_by(statement) {
            return;
        }

        result.push(Violation::new(
            Self::NAME,
            RiskLevel::Low,
            "paginated query has no ORDER BY; page contents are not deterministic",
            "order by a unique column so pages are stable across executions",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;
    use sqlsentinel_config::PaginationConfig;
    use sqlsentinel_types::{ExecutionLayer, StatementId};

    use crate::context::SqlContext;
    use crate::pagination::PaginationDetector;

    fn run(sql: &str) -> ValidationResult {
        let dialect = GenericDialect {};
        let statement = Parser::parse_sql(&dialect, sql)
            .expect("test SQL parses")
            .remove(0);
        let context = SqlContext::inferred(
            sql,
            ExecutionLayer::Orm,
            StatementId::mapper("UserMapper", "page"),
        );
        let detector = PaginationDetector::new(&PaginationConfig::default(), vec![]);
        let target = CheckTarget::new(&context, Some(&statement), &detector);

        let mut result = ValidationResult::new();
        MissingOrderByChecker::new(MissingOrderByConfig::default()).check(&target, &mut result);
        result
    }

    #[test]
    fn flags_paginated_query_without_order_by() {
        let result = run("SELECT * FROM users WHERE id > 0 LIMIT 10");
        assert_eq!(result.risk_level(), RiskLevel::Low);
    }

    #[test]
    fn any_order_by_passes() {
        assert!(run("SELECT * FROM users WHERE id > 0 ORDER BY name LIMIT 10").passed());
    }

    #[test]
    fn unpaginated_queries_are_ignored() {
        assert!(run("SELECT * FROM users WHERE id > 0").passed());
    }
}
