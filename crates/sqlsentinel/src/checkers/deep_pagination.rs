//! Deep OFFSET pagination.
//!
//! `LIMIT 100 OFFSET 1000000` makes the database produce and discard a
//! million rows per page. Thresholds compare literal values only; a bind
//! placeholder in the offset position is unknowable at validation time and
//! bypasses the rule.

use sqlsentinel_config::DeepPaginationConfig;
use sqlsentinel_types::{PaginationKind, RiskLevel, ValidationResult, Violation};

use crate::ast;
use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct DeepPaginationChecker {
    config: DeepPaginationConfig,
}

impl DeepPaginationChecker {
    pub const NAME: &'static str = "deep-pagination";

    pub fn new(config: DeepPaginationConfig) -> Self {
        Self { config }
    }
}

impl RuleChecker for DeepPaginationChecker {
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
        let Some(spec) = ast::select_limit(statement) else {
            return;
        };
        let Some(offset) = spec.offset else {
            return;
        };
        if offset <= self.config.max_offset {
            return;
        }

        result.push(Violation::new(
            Self::NAME,
            RiskLevel::Medium,
            format!(
                "offset {offset} exceeds the deep-pagination threshold of {}",
                self.config.max_offset
            ),
            "switch to keyset pagination: filter on the last seen key and order by it",
        ));
    }
}
