//! WHERE clauses built only from state-flag columns.
//!
//! A predicate like `WHERE deleted = 0` looks filtered but matches most of
//! the table. The rule fires when every referenced column is blacklisted;
//! one real column in the mix is enough to pass.

use std::collections::BTreeSet;

use sqlsentinel_config::BlacklistFieldConfig;
use sqlsentinel_types::{RiskLevel, ValidationResult, Violation};

use crate::ast;
use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct BlacklistFieldChecker {
    enabled: bool,
    exact: BTreeSet<String>,
    /// Lowercased prefixes from `*`-suffixed config entries.
    prefixes: Vec<String>,
}

impl BlacklistFieldChecker {
    pub const NAME: &'static str = "blacklist-field";

    pub fn new(config: &BlacklistFieldConfig) -> Self {
        let mut exact = BTreeSet::new();
        let mut prefixes = Vec::new();
        for field in &config.fields {
            let lowered = field.to_lowercase();
            if let Some(prefix) = lowered.strip_suffix('*') {
                prefixes.push(prefix.to_string());
            } else {
                exact.insert(lowered);
            }
        }
        Self {
            enabled: config.enabled,
            exact,
            prefixes,
        }
    }

    fn is_blacklisted(&self, field: &str) -> bool {
        self.exact.contains(field)
            || self
                .prefixes
                .iter()
                .any(|prefix| field.starts_with(prefix.as_str()))
    }
}

impl RuleChecker for BlacklistFieldChecker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn check(&self, target: &CheckTarget<'_>, result: &mut ValidationResult) {
        let Some(where_expr) = target.where_clause() else {
            return;
        };
        let fields = ast::referenced_fields(where_expr);
        if fields.is_empty() {
            return;
        }
        if !fields.iter().all(|field| self.is_blacklisted(field)) {
            return;
        }

        let listed = fields.iter().cloned().collect::<Vec<_>>().join(", ");
        result.push(Violation::new(
            Self::NAME,
            RiskLevel::High,
            format!("WHERE clause filters only on state-flag columns ({listed})"),
            "add a selective predicate such as a primary key, tenant id or indexed business column",
        ));
    }
}
