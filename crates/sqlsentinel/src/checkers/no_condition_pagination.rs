//! Paginated full-table scans.
//!
//! A LIMIT on an unfiltered query still forces the database to scan and
//! order the whole table before slicing. This rule fires CRITICAL and
//! raises the early-return signal so the finer pagination rules keep quiet:
//! a developer staring at an unconditioned LIMIT should fix the missing
//! WHERE first, not wade through offset and page-size noise.

use sqlsentinel_config::NoConditionPaginationConfig;
use sqlsentinel_types::{PaginationKind, RiskLevel, ValidationResult, Violation};

use crate::ast;
use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct NoConditionPaginationChecker {
    config: NoConditionPaginationConfig,
}

impl NoConditionPaginationChecker {
    pub const NAME: &'static str = "no-condition-pagination";

    pub fn new(config: NoConditionPaginationConfig) -> Self {
        Self { config }
    }
}

impl RuleChecker for NoConditionPaginationChecker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn check(&self, target: &CheckTarget<'_>, result: &mut ValidationResult) {
        if target.pagination() != PaginationKind::Physical {
            return;
        }
        let Some(_statement) = target.statement else {
            return;
        };

        let unfiltered = match target.where_clause() {
            None => true,
            Some(where_expr) => ast::is_effectively_unfiltered(where_expr),
        };
        if !unfiltered {
            return;
        }

        result.push(Violation::new(
            Self::NAME,
            RiskLevel::Critical,
            "paginated query has no filtering condition; the LIMIT still scans the whole table",
            "add a selective WHERE clause before paginating",
        ));
        result.set_early_return();
    }
}
