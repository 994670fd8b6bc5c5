//! In-memory pagination.
//!
//! The mapper accepted pagination intent but nothing rewrites the SQL: the
//! driver materializes the entire result set and the framework slices it in
//! application memory. On a large table this is an OOM waiting to happen.

use sqlsentinel_config::LogicalPaginationConfig;
use sqlsentinel_types::{PaginationKind, RiskLevel, ValidationResult, Violation};

use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct LogicalPaginationChecker {
    config: LogicalPaginationConfig,
}

impl LogicalPaginationChecker {
    pub const NAME: &'static str = "logical-pagination";

    pub fn new(config: LogicalPaginationConfig) -> Self {
        Self { config }
    }
}

impl RuleChecker for LogicalPaginationChecker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn check(&self, target: &CheckTarget<'_>, result: &mut ValidationResult) {
        if target.pagination() != PaginationKind::Logical {
            return;
        }

        let message = match target.context.page_bounds_hint() {
            Some((offset, limit)) => format!(
                "pagination happens in memory: the full result set is fetched, \
                 then sliced at offset {offset} with page size {limit}"
            ),
            None => "pagination happens in memory: the full result set is fetched \
                     before the requested page is sliced out"
                .to_string(),
        };
        result.push(Violation::new(
            Self::NAME,
            RiskLevel::Critical,
            message,
            "install a pagination plugin or put LIMIT/OFFSET into the statement itself",
        ));
    }
}
