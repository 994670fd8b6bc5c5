//! The rule checkers.
//!
//! Every rule implements [`RuleChecker`]: a side-effect-only `check` that
//! appends findings to the shared result, plus an `enabled` flag read from
//! its own configuration record. Checkers never fail for domain reasons and
//! skip silently when the context has no parseable statement.
//!
//! [`build_checkers`] assembles the full set in the fixed pipeline order;
//! the order matters because the unconditioned-LIMIT rule raises the
//! early-return signal that the three finer pagination rules honor on the
//! same pass.

use sqlsentinel_config::CheckerConfigs;
use sqlsentinel_types::ValidationResult;

use crate::context::CheckTarget;

mod blacklist_field;
mod deep_pagination;
mod dummy_condition;
mod large_page_size;
mod logical_pagination;
mod missing_order_by;
mod no_condition_pagination;
mod no_pagination;
mod no_where_clause;
mod whitelist_field;

pub use blacklist_field::BlacklistFieldChecker;
pub use deep_pagination::DeepPaginationChecker;
pub use dummy_condition::DummyConditionChecker;
pub use large_page_size::LargePageSizeChecker;
pub use logical_pagination::LogicalPaginationChecker;
pub use missing_order_by::MissingOrderByChecker;
pub use no_condition_pagination::NoConditionPaginationChecker;
pub use no_pagination::NoPaginationChecker;
pub use no_where_clause::NoWhereClauseChecker;
pub use whitelist_field::WhitelistFieldChecker;

/// One validation rule.
pub trait RuleChecker: Send + Sync {
    /// Machine-readable rule name, used in violations and logs.
    fn name(&self) -> &'static str;

    /// Whether this rule participates in the pipeline.
    fn enabled(&self) -> bool;

    /// Inspects the target and appends zero or more violations.
    fn check(&self, target: &CheckTarget<'_>, result: &mut ValidationResult);
}

/// Builds the full checker set in pipeline order.
pub fn build_checkers(configs: &CheckerConfigs) -> Vec<Box<dyn RuleChecker>> {
    vec![
        Box::new(NoWhereClauseChecker::new(configs.no_where_clause)),
        Box::new(DummyConditionChecker::new(&configs.dummy_condition)),
        Box::new(BlacklistFieldChecker::new(&configs.blacklist_field)),
        Box::new(WhitelistFieldChecker::new(&configs.whitelist_field)),
        Box::new(LogicalPaginationChecker::new(configs.logical_pagination)),
        Box::new(NoConditionPaginationChecker::new(
            configs.no_condition_pagination,
        )),
        Box::new(DeepPaginationChecker::new(configs.deep_pagination)),
        Box::new(LargePageSizeChecker::new(configs.large_page_size)),
        Box::new(MissingOrderByChecker::new(configs.missing_order_by)),
        Box::new(NoPaginationChecker::new(&configs.no_pagination)),
    ]
}
