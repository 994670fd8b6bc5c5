//! # sqlsentinel: SQL safety engine
//!
//! SQLSentinel inspects every SQL statement an application is about to
//! execute, classifies its risk, and hands the caller a structured verdict
//! to block, warn or log on. It catches the classic destructive patterns
//! before they reach the database: unconditional UPDATE/DELETE,
//! tautological WHERE clauses, state-flag-only filters, in-memory
//! pagination, deep offsets, unpaginated scans of large tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        SqlValidator                          │
//! │  ┌─────────┐   ┌──────────┐   ┌───────────────────────────┐  │
//! │  │  Dedup  │ → │  Parser  │ → │      CheckerPipeline      │  │
//! │  │ (cache) │   │ (1 pass) │   │ 10 rules, fixed order     │  │
//! │  └─────────┘   └──────────┘   │ pagination detector inside│  │
//! │                               └───────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine never executes or rewrites SQL, never touches the network,
//! and never fails for domain reasons: risky statements come back as
//! violations inside a [`ValidationResult`], and the caller's
//! [`ViolationStrategy`] decides what happens next.
//!
//! ## Usage
//!
//! ```
//! use sqlsentinel::{EngineConfig, SqlContext, SqlValidator};
//! use sqlsentinel::{ExecutionLayer, RiskLevel, StatementId};
//!
//! let validator = SqlValidator::new(&EngineConfig::default());
//!
//! let context = SqlContext::inferred(
//!     "UPDATE users SET status = 'inactive'",
//!     ExecutionLayer::Orm,
//!     StatementId::mapper("com.example.UserMapper", "deactivateAll"),
//! );
//!
//! let result = validator.validate(&context).expect("lenient mode never errors");
//! assert_eq!(result.risk_level(), RiskLevel::Critical);
//! ```
//!
//! ## Modules
//!
//! - [`ast`]: shared AST utilities consumed by the rule checkers
//! - [`checkers`]: the ten rules and the [`checkers::RuleChecker`] trait
//! - [`pagination`]: logical/physical/none classification
//! - [`dedup`]: per-thread verdict cache for hot statements

pub mod ast;
pub mod checkers;
mod context;
pub mod dedup;
mod error;
pub mod pagination;
mod parser;
mod pipeline;


pub use context::{CheckTarget, SqlContext};
pub use dedup::DedupFilter;
pub use error::SqlParseError;
pub use pagination::{PaginationDetector, PluginDescriptor};
pub use parser::StatementParser;
pub use pipeline::CheckerPipeline;

// Re-export the domain vocabulary and configuration surface so adapters can
// depend on this crate alone.
pub use sqlsentinel_config::{EngineConfig, ParserMode};
pub use sqlsentinel_types::{
    AuditEvent, BlockedStatementError, BoundParameter, BoundValue, ExecutionLayer, PaginationKind,
    RiskLevel, RowBounds, SqlKind, StatementId, ValidationResult, Violation, ViolationStrategy,
};

use tracing::debug;

/// The validation entry point.
///
/// Construction wires the parser facade, the pagination detector, the
/// checker pipeline and the deduplication filter from one [`EngineConfig`].
/// All of it is immutable afterwards, so one validator can be shared across
/// threads; the dedup cache is thread-local by design. Reconfiguring means
/// building a new validator, which also invalidates every cached verdict.
pub struct SqlValidator {
    parser: StatementParser,
    detector: PaginationDetector,
    pipeline: CheckerPipeline,
    dedup: DedupFilter,
}

impl SqlValidator {
    /// A validator with no pagination plugins registered.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_plugins(config, Vec::new())
    }

    /// A validator that knows about the mapper layer's registered plugins.
    pub fn with_plugins(config: &EngineConfig, plugins: Vec<PluginDescriptor>) -> Self {
        Self {
            parser: StatementParser::new(config.parser.mode),
            detector: PaginationDetector::new(&config.pagination, plugins),
            pipeline: CheckerPipeline::from_config(&config.checkers),
            dedup: DedupFilter::new(&config.dedup),
        }
    }

    /// Validates one statement context.
    ///
    /// Sequence: consult the dedup cache, parse once if the caller supplied
    /// no AST, run the pipeline, cache and return the verdict. In lenient
    /// parser mode an unparseable statement yields a SAFE pass without
    /// running any checker; in fail-fast mode the parse error propagates.
    pub fn validate(&self, context: &SqlContext) -> Result<ValidationResult, SqlParseError> {
        if let Some(cached) = self.dedup.lookup(context) {
            return Ok(cached);
        }

        // Parse-once: whichever AST we settle on here is the one every
        // checker reads.
        let parsed;
        let statement = match &context.statement {
            Some(statement) => Some(statement),
            None => match self.parser.parse(&context.sql)? {
                Some(statement) => {
                    parsed = statement;
                    Some(&parsed)
                }
                None => {
                    debug!(
                        statement_id = %context.statement_id,
                        "lenient parse failure, passing without checks"
                    );
                    return Ok(ValidationResult::new());
                }
            },
        };

        let target = CheckTarget::new(context, statement, &self.detector);
        let mut result = ValidationResult::new();
        self.pipeline.run(&target, &mut result);

        self.dedup.store(context, &result);
        Ok(result)
    }

    /// Drops the dedup cache of the calling thread.
    ///
    /// Callers that manage their own threads should invoke this at thread
    /// teardown.
    pub fn clear_thread_cache(&self) {
        self.dedup.clear_thread_cache();
    }
}
