//! Per-table mandatory-field enforcement.
//!
//! Deployments map a table to the predicates every statement against it
//! must carry (any one suffices, typically the tenant id or the primary
//! key). Tables outside the map are skipped unless the global fallback is
//! switched on.

use std::collections::HashMap;

use sqlsentinel_config::WhitelistFieldConfig;
use sqlsentinel_types::{RiskLevel, SqlKind, ValidationResult, Violation};

use crate::ast;
use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct WhitelistFieldChecker {
    enabled: bool,
    tables: HashMap<String, Vec<String>>,
    enforce_for_unknown_tables: bool,
    global_fields: Vec<String>,
}

impl WhitelistFieldChecker {
    pub const NAME: &'static str = "whitelist-field";

    pub fn new(config: &WhitelistFieldConfig) -> Self {
        let tables = config
            .tables
            .iter()
            .map(|(table, fields)| {
                (
                    table.to_lowercase(),
                    fields.iter().map(|f| f.to_lowercase()).collect(),
                )
            })
            .collect();
        Self {
            enabled: config.enabled,
            tables,
            enforce_for_unknown_tables: config.enforce_for_unknown_tables,
            global_fields: config
                .global_fields
                .iter()
                .map(|f| f.to_lowercase())
                .collect(),
        }
    }

    fn required_fields(&self, table: &str) -> Option<&[String]> {
        if let Some(fields) = self.tables.get(table) {
            return Some(fields.as_slice());
        }
        if self.enforce_for_unknown_tables && !self.global_fields.is_empty() {
            return Some(self.global_fields.as_slice());
        }
        None
    }
}

impl RuleChecker for WhitelistFieldChecker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn check(&self, target: &CheckTarget<'_>, result: &mut ValidationResult) {
        if !matches!(
            target.context.kind,
            SqlKind::Select | SqlKind::Update | SqlKind::Delete
        ) {
            return;
        }
        let Some(statement) = target.statement else {
            return;
        };
        let Some(table) = ast::primary_table(statement) else {
            return;
        };
        let Some(required) = self.required_fields(&table.to_lowercase()) else {
            return;
        };

        let referenced = target
            .where_clause()
            .map(ast::referenced_fields)
            .unwrap_or_default();
        if required.iter().any(|field| referenced.contains(field)) {
            return;
        }

        result.push(Violation::new(
            Self::NAME,
            RiskLevel::Medium,
            format!(
                "statement on `{table}` references none of its mandatory fields ({})",
                required.join(", ")
            ),
            "filter on one of the mandatory predicates for this table",
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

    fn users_config() -> WhitelistFieldConfig {
        WhitelistFieldConfig {
            enabled: true,
            tables: HashMap::from([(
                "users".to_string(),
                vec!["id".to_string(), "tenant_id".to_string()],
            )]),
            enforce_for_unknown_tables: false,
            global_fields: Vec::new(),
        }
    }

    fn run_with(config: &WhitelistFieldConfig, sql: &str) -> ValidationResult {
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
        WhitelistFieldChecker::new(config).check(&target, &mut result);
        result
    }

    #[test]
    fn flags_mapped_table_without_mandatory_field() {
        let result = run_with(&users_config(), "SELECT * FROM users WHERE name = 'x'");
        assert_eq!(result.risk_level(), RiskLevel::Medium);
        assert!(result.violations()[0].message.contains("tenant_id"));
    }

    #[test]
    fn any_one_mandatory_field_suffices() {
        let config = users_config();
        assert!(run_with(&config, "SELECT * FROM users WHERE tenant_id = 3").passed());
        assert!(run_with(&config, "SELECT * FROM users WHERE id = 1 AND name = 'x'").passed());
    }

    #[test]
    fn also_applies_to_update_and_delete() {
        let config = users_config();
        let update = run_with(&config, "UPDATE users SET name = 'x' WHERE name = 'y'");
        assert_eq!(update.risk_level(), RiskLevel::Medium);
        let delete = run_with(&config, "DELETE FROM users WHERE status = 1");
        assert_eq!(delete.risk_level(), RiskLevel::Medium);
    }

    #[test]
    fn missing_where_counts_as_missing_fields() {
        let result = run_with(&users_config(), "SELECT * FROM users");
        assert_eq!(result.risk_level(), RiskLevel::Medium);
    }

    #[test]
    fn unmapped_tables_are_skipped_by_default() {
        assert!(run_with(&users_config(), "SELECT * FROM orders WHERE name = 'x'").passed());
    }

    #[test]
    fn global_fallback_covers_unknown_tables() {
        let config = WhitelistFieldConfig {
            enforce_for_unknown_tables: true,
            global_fields: vec!["tenant_id".to_string()],
            ..users_config()
        };
        let flagged = run_with(&config, "SELECT * FROM orders WHERE name = 'x'");
        assert_eq!(flagged.risk_level(), RiskLevel::Medium);
        assert!(run_with(&config, "SELECT * FROM orders WHERE tenant_id = 9").passed());
    }

    #[test]
    fn table_lookup_is_case_insensitive() {
        let result = run_with(&users_config(), "SELECT * FROM Users WHERE name = 'x'");
        assert_eq!(result.risk_level(), RiskLevel::Medium);
    }
}
