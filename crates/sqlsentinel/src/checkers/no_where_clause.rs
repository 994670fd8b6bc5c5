//! Unconditional UPDATE/DELETE, the single most destructive bug class.

use sqlparser::ast::Statement;

use sqlsentinel_config::NoWhereClauseConfig;
use sqlsentinel_types::{RiskLevel, SqlKind, ValidationResult, Violation};

use crate::ast;
use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct NoWhereClauseChecker {
    config: NoWhereClauseConfig,
}

impl NoWhereClauseChecker {
    pub const NAME: &'static str = "no-where-clause";

    pub fn new(config: NoWhereClauseConfig) -> Self {
        Self { config }
    }
}

impl RuleChecker for NoWhereClauseChecker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn check(&self, target: &CheckTarget<'_>, result: &mut ValidationResult) {
        if !matches!(target.context.kind, SqlKind::Update | SqlKind::Delete) {
            return;
        }
        let Some(statement) = target.statement else {
            return;
        };
        // The AST decides: a mislabeled context must not flag a SELECT.
        if !matches!(statement, Statement::Update { .. } | Statement::Delete(_)) {
            return;
        }
        if ast::where_clause(statement).is_some() {
            return;
        }

        let table = ast::primary_table(statement).unwrap_or_else(|| "<unknown>".to_string());
        result.push(Violation::new(
            Self::NAME,
            RiskLevel::Critical,
            format!(
                "{} on `{table}` has no WHERE clause and affects every row in the table",
                target.context.kind
            ),
            "add a WHERE clause, or run the change in bounded batches with explicit keys",
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
            StatementId::mapper("UserMapper", "stmt"),
        );
        let detector = PaginationDetector::new(&PaginationConfig::default(), vec![]);
        let target = CheckTarget::new(&context, Some(&statement), &detector);

        let mut result = ValidationResult::new();
        NoWhereClauseChecker::new(NoWhereClauseConfig::default()).check(&target, &mut result);
        result
    }

    #[test]
    fn flags_update_without_where() {
        let result = run("UPDATE users SET status = 'inactive'");
        assert_eq!(result.risk_level(), RiskLevel::Critical);
        assert!(result.violations()[0].message.contains("`users`"));
    }

    #[test]
    fn flags_delete_without_where() {
        let result = run("DELETE FROM users");
        assert_eq!(result.risk_level(), RiskLevel::Critical);
    }

    #[test]
    fn passes_update_with_where() {
        assert!(run("UPDATE users SET status = 'inactive' WHERE id = 1").passed());
    }

    #[test]
    fn ignores_selects_and_inserts() {
        assert!(run("SELECT * FROM users").passed());
        assert!(run("INSERT INTO users (id) VALUES (1)").passed());
    }
}
