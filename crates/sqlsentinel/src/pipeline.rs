//! The checker pipeline.
//!
//! Runs every enabled checker in a fixed order with no short-circuit: every
//! violation gets reported in one pass. Each checker writes into a scratch
//! result that is folded into the shared one on success, so a checker that
//! panics contributes nothing: one buggy rule must never disable the
//! validator.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::error;

use sqlsentinel_config::CheckerConfigs;
use sqlsentinel_types::ValidationResult;

use crate::checkers::{RuleChecker, build_checkers};
use crate::context::CheckTarget;

pub struct CheckerPipeline {
    checkers: Vec<Box<dyn RuleChecker>>,
}

impl CheckerPipeline {
    /// A pipeline over an explicit checker list, in the given order.
    pub fn new(checkers: Vec<Box<dyn RuleChecker>>) -> Self {
        Self { checkers }
    }

    /// The standard ten-rule pipeline in its fixed order.
    pub fn from_config(configs: &CheckerConfigs) -> Self {
        Self::new(build_checkers(configs))
    }

    /// Names of the registered checkers, in execution order.
    pub fn checker_names(&self) -> Vec<&'static str> {
        self.checkers.iter().map(|checker| checker.name()).collect()
    }

    /// Runs every enabled checker against the target.
    ///
    /// Disabling a checker removes it from the pass without affecting the
    /// relative order of the others. The early-return signal raised by one
    /// checker is visible to every checker after it.
    pub fn run(&self, target: &CheckTarget<'_>, result: &mut ValidationResult) {
        for checker in &self.checkers {
            if !checker.enabled() {
                continue;
            }

            let early_return = result.early_return();
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                let mut scratch = ValidationResult::new();
                if early_return {
                    scratch.set_early_return();
                }
                checker.check(target, &mut scratch);
                scratch
            }));

            match outcome {
                Ok(scratch) => result.merge(scratch),
                Err(_) => {
                    error!(
                        checker = checker.name(),
                        statement_id = %target.context.statement_id,
                        "rule checker panicked; continuing with the remaining checkers"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;
    use sqlsentinel_config::PaginationConfig;
    use sqlsentinel_types::{ExecutionLayer, RiskLevel, StatementId, Violation};

    use crate::context::SqlContext;
    use crate::pagination::PaginationDetector;

    struct FixedChecker {
        name: &'static str,
        enabled: bool,
        risk: RiskLevel,
    }

    impl RuleChecker for FixedChecker {
        fn name(&self) -> &'static str {
            self.name
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn check(&self, _target: &CheckTarget<'_>, result: &mut ValidationResult) {
            result.push(Violation::new(self.name, self.risk, "m", "s"));
        }
    }

    struct PanickingChecker;

    impl RuleChecker for PanickingChecker {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn enabled(&self) -> bool {
            true
        }

        fn check(&self, _target: &CheckTarget<'_>, _result: &mut ValidationResult) {
            panic!("checker bug");
        }
    }

    fn run_pipeline(pipeline: &CheckerPipeline) -> ValidationResult {
        let sql = "SELECT * FROM users WHERE id = 1";
        let dialect = GenericDialect {};
        let statement = Parser::parse_sql(&dialect, sql)
            .expect("test SQL parses")
            .remove(0);
        let context = SqlContext::inferred(
            sql,
            ExecutionLayer::Orm,
            StatementId::mapper("UserMapper", "get"),
        );
        let detector = PaginationDetector::new(&PaginationConfig::default(), vec![]);
        let target = CheckTarget::new(&context, Some(&statement), &detector);

        let mut result = ValidationResult::new();
        pipeline.run(&target, &mut result);
        result
    }

    #[test]
    fn the_standard_pipeline_order_is_fixed() {
        let pipeline = CheckerPipeline::from_config(&CheckerConfigs::default());
        assert_eq!(
            pipeline.checker_names(),
            vec![
                "no-where-clause",
                "dummy-condition",
                "blacklist-field",
                "whitelist-field",
                "logical-pagination",
                "no-condition-pagination",
                "deep-pagination",
                "large-page-size",
                "missing-order-by",
                "no-pagination",
            ]
        );
    }

    #[test]
    fn every_enabled_checker_runs_without_short_circuit() {
        let pipeline = CheckerPipeline::new(vec![
            Box::new(FixedChecker {
                name: "first",
                enabled: true,
                risk: RiskLevel::Critical,
            }),
            Box::new(FixedChecker {
                name: "second",
                enabled: true,
                risk: RiskLevel::Low,
            }),
        ]);

        let result = run_pipeline(&pipeline);
        let rules: Vec<_> = result.violations().iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["first", "second"]);
        assert_eq!(result.risk_level(), RiskLevel::Critical);
    }

    #[test]
    fn disabled_checkers_are_skipped_in_place() {
        let pipeline = CheckerPipeline::new(vec![
            Box::new(FixedChecker {
                name: "first",
                enabled: true,
                risk: RiskLevel::Low,
            }),
            Box::new(FixedChecker {
                name: "second",
                enabled: false,
                risk: RiskLevel::Low,
            }),
            Box::new(FixedChecker {
                name: "third",
                enabled: true,
                risk: RiskLevel::Low,
            }),
        ]);

        let result = run_pipeline(&pipeline);
        let rules: Vec<_> = result.violations().iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["first", "third"]);
    }

    #[test]
    fn a_panicking_checker_does_not_take_down_the_pass() {
        let pipeline = CheckerPipeline::new(vec![
            Box::new(PanickingChecker),
            Box::new(FixedChecker {
                name: "after",
                enabled: true,
                risk: RiskLevel::High,
            }),
        ]);

        let result = run_pipeline(&pipeline);
        let rules: Vec<_> = result.violations().iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["after"]);
        assert_eq!(result.risk_level(), RiskLevel::High);
    }
}
