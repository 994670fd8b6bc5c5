//! Unpaginated SELECTs on large-volume tables.
//!
//! Ships disabled until a deployment names its large tables. When enabled,
//! any SELECT with neither a LIMIT nor a pagination parameter is flagged at
//! the severity configured for its table, or at the default severity for
//! tables not listed. Statement ids with a legitimate need for full reads
//! (batch jobs, admin reports) go on the exemption list.

use std::collections::{BTreeSet, HashMap};

use sqlsentinel_config::NoPaginationConfig;
use sqlsentinel_types::{PaginationKind, RiskLevel, SqlKind, ValidationResult, Violation};

use crate::ast;
use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct NoPaginationChecker {
    enabled: bool,
    tables: HashMap<String, RiskLevel>,
    default_risk: RiskLevel,
    exempt_statements: BTreeSet<String>,
}

impl NoPaginationChecker {
    pub const NAME: &'static str = "no-pagination";

    pub fn new(config: &NoPaginationConfig) -> Self {
        Self {
            enabled: config.enabled,
            tables: config
                .tables
                .iter()
                .map(|(table, risk)| (table.to_lowercase(), *risk))
                .collect(),
            default_risk: config.default_risk,
            exempt_statements: config.exempt_statements.iter().cloned().collect(),
        }
    }
}

impl RuleChecker for NoPaginationChecker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn check(&self, target: &CheckTarget<'_>, result: &mut ValidationResult) {
        if target.context.kind != SqlKind::Select {
            return;
        }
        if target.pagination() != PaginationKind::None {
            return;
        }
        if self
            .exempt_statements
            .contains(target.context.statement_id.as_str())
        {
            return;
        }
        let Some(statement) = target.statement else {
            return;
        };
        let Some(table) = ast::primary_table(statement) else {
            return;
        };

        let risk = self
            .tables
            .get(&table.to_lowercase())
            .copied()
            .unwrap_or(self.default_risk);
        result.push(Violation::new(
            Self::NAME,
            risk,
            format!("unpaginated SELECT on `{table}` may fetch the entire table"),
            "add a LIMIT or pass pagination parameters; exempt the statement id if a \
             full read is intended",
        ));
    }
}
