//! Tautological WHERE clauses (`1=1`, `'a'='a'`, TRUE).
//!
//! Two detectors combined: a pattern match over the normalized WHERE text,
//! extensible per deployment, and a structural walk of the AST. Either one
//! firing is enough.

use sqlsentinel_config::DummyConditionConfig;
use sqlsentinel_types::{RiskLevel, ValidationResult, Violation};

use crate::ast;
use crate::checkers::RuleChecker;
use crate::context::CheckTarget;

pub struct DummyConditionChecker {
    enabled: bool,
    /// Patterns with operators or quotes, matched as substrings of the
    /// whitespace-stripped WHERE text.
    symbol_patterns: Vec<String>,
    /// Purely word-shaped patterns (`true`), matched only against the whole
    /// WHERE text so that a real comparison like `enabled = true` does not
    /// trip them; tautologies nested under AND/OR are the AST walk's job.
    word_patterns: Vec<String>,
}

impl DummyConditionChecker {
    pub const NAME: &'static str = "dummy-condition";

    pub fn new(config: &DummyConditionConfig) -> Self {
        let mut symbol_patterns = Vec::new();
        let mut word_patterns = Vec::new();
        for pattern in &config.patterns {
            let normalized: String = pattern
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if normalized.is_empty() {
                continue;
            }
            if normalized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                word_patterns.push(normalized);
            } else {
                symbol_patterns.push(normalized);
            }
        }
        Self {
            enabled: config.enabled,
            symbol_patterns,
            word_patterns,
        }
    }

    fn matches_pattern(&self, where_text: &str) -> bool {
        let stripped: String = where_text
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if self
            .symbol_patterns
            .iter()
            .any(|pattern| stripped.contains(pattern.as_str()))
        {
            return true;
        }
        self.word_patterns.iter().any(|pattern| stripped == *pattern)
    }
}

impl RuleChecker for DummyConditionChecker {
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

        let pattern_hit = self.matches_pattern(&where_expr.to_string());
        let ast_hit = ast::contains_dummy_condition(where_expr);
        if !pattern_hit && !ast_hit {
            return;
        }

        result.push(Violation::new(
            Self::NAME,
            RiskLevel::High,
            "WHERE clause contains a tautology and does not filter rows",
            "remove the always-true predicate and keep only real conditions",
        ));
    }
}
