//! Oversized pages.
//!
//! Fires when the literal LIMIT row count exceeds the configured page-size
//! ceiling. Independent of the deep-pagination rule: a single statement can
//! be flagged for both a huge offset and a huge page.

use sqlsentinel_config::LargePageSizeConfig;
use sqlsentinel_types::{PaginationKind, RiskLevel, ValidationResult, Violation};

use crate::ast;
use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct LargePageSizeChecker {
    config: LargePageSizeConfig,
}

impl LargePageSizeChecker {
    pub const NAME: &'static str = "large-page-size";

    pub fn new(config: LargePageSizeConfig) -> Self {
        Self { config }
    }
}

impl RuleChecker for LargePageSizeChecker {
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
        let Some(row_count) = spec.row_count else {
            return;
        };
        if row_count <= self.config.max_page_size {
            return;
        }

        result.push(Violation::new(
            Self::NAME,
            RiskLevel::Medium,
            format!(
                "page size {row_count} exceeds the configured maximum of {}",
                self.config.max_page_size
            ),
            "reduce the page size and iterate, or stream the result in batches",
        ));
    }
}
