//! Configuration management for `SQLSentinel`
//!
//! One nested record per checker (a boolean `enabled` plus rule-specific
//! parameters) alongside engine-level settings for the parser, the
//! deduplication cache, and pagination-plugin detection.
//!
//! The engine consumes already-deserialized [`EngineConfig`] values; the
//! [`ConfigLoader`] is a convenience that layers them from multiple sources:
//! 1. Environment variables (`SQLSENTINEL__*` prefix, highest precedence)
//! 2. `sqlsentinel.local.toml` (gitignored, local overrides)
//! 3. `sqlsentinel.toml` (git-tracked, project config)
//! 4. Built-in defaults (lowest precedence)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use sqlsentinel_types::RiskLevel;

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

/// Main engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parser: ParserConfig,
    pub dedup: DedupConfig,
    pub pagination: PaginationConfig,
    pub checkers: CheckerConfigs,
}

impl EngineConfig {
    /// Load configuration from default locations.
    pub fn load() -> anyhow::Result<Self> {
        ConfigLoader::new().load()
    }

    /// Rejects configurations that would make the engine misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dedup.capacity == 0 {
            return Err(ConfigError::Invalid(
                "dedup.capacity must be greater than zero".to_string(),
            ));
        }
        if self.dedup.ttl_ms == 0 {
            return Err(ConfigError::Invalid(
                "dedup.ttl_ms must be greater than zero".to_string(),
            ));
        }
        if self.checkers.deep_pagination.max_offset == 0 {
            return Err(ConfigError::Invalid(
                "checkers.deep_pagination.max_offset must be greater than zero".to_string(),
            ));
        }
        if self.checkers.large_page_size.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "checkers.large_page_size.max_page_size must be greater than zero".to_string(),
            ));
        }
        if self.checkers.dummy_condition.patterns.is_empty()
            && self.checkers.dummy_condition.enabled
        {
            return Err(ConfigError::Invalid(
                "checkers.dummy_condition.patterns must not be empty while the checker is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// How the parser facade reacts to ungrammatical SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParserMode {
    /// Raise a typed parse error to the caller.
    FailFast,
    /// Log a warning and skip validation with a pass.
    #[default]
    Lenient,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub mode: ParserMode,
}

/// Sizing for the per-thread deduplication cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub ttl_ms: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1000,
            ttl_ms: 100,
        }
    }
}

/// Pagination-plugin detection.
///
/// Plugins are matched by descriptor-name suffix, never by concrete type, so
/// the engine carries no dependency on any pagination library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub plugin_suffixes: Vec<String>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            plugin_suffixes: vec![
                "PageInterceptor".to_string(),
                "PaginationInterceptor".to_string(),
                "PaginationInnerInterceptor".to_string(),
                "PageHelper".to_string(),
            ],
        }
    }
}

/// Per-checker configuration records, one per rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfigs {
    pub no_where_clause: NoWhereClauseConfig,
    pub dummy_condition: DummyConditionConfig,
    pub blacklist_field: BlacklistFieldConfig,
    pub whitelist_field: WhitelistFieldConfig,
    pub logical_pagination: LogicalPaginationConfig,
    pub no_condition_pagination: NoConditionPaginationConfig,
    pub deep_pagination: DeepPaginationConfig,
    pub large_page_size: LargePageSizeConfig,
    pub missing_order_by: MissingOrderByConfig,
    pub no_pagination: NoPaginationConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct NoWhereClauseConfig {
    pub enabled: bool,
}

impl Default for NoWhereClauseConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DummyConditionConfig {
    pub enabled: bool,
    /// Tautology patterns matched against the normalized WHERE text.
    pub patterns: Vec<String>,
}

impl Default for DummyConditionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: vec![
                "1=1".to_string(),
                "'1'='1'".to_string(),
                "'a'='a'".to_string(),
                "true".to_string(),
            ],
        }
    }
}

/// State-flag columns that cannot carry a WHERE clause on their own.
///
/// Entries ending in `*` are prefix patterns (`create_*` matches
/// `create_time`, `create_by`, ...). Matching is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistFieldConfig {
    pub enabled: bool,
    pub fields: Vec<String>,
}

impl Default for BlacklistFieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fields: vec![
                "deleted".to_string(),
                "del_flag".to_string(),
                "status".to_string(),
                "is_deleted".to_string(),
                "enabled".to_string(),
                "type".to_string(),
                "create_*".to_string(),
            ],
        }
    }
}

/// Per-table mandatory-field enforcement.
///
/// A table listed in `tables` must reference at least one of its listed
/// fields in WHERE (any one suffices). Unlisted tables are skipped unless
/// `enforce_for_unknown_tables` is set, in which case `global_fields`
/// applies to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhitelistFieldConfig {
    pub enabled: bool,
    pub tables: HashMap<String, Vec<String>>,
    pub enforce_for_unknown_tables: bool,
    pub global_fields: Vec<String>,
}

impl Default for WhitelistFieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tables: HashMap::new(),
            enforce_for_unknown_tables: false,
            global_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicalPaginationConfig {
    pub enabled: bool,
}

impl Default for LogicalPaginationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct NoConditionPaginationConfig {
    pub enabled: bool,
}

impl Default for NoConditionPaginationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepPaginationConfig {
    pub enabled: bool,
    /// Largest literal OFFSET tolerated before flagging.
    pub max_offset: u64,
}

impl Default for DeepPaginationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_offset: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LargePageSizeConfig {
    pub enabled: bool,
    /// Largest literal LIMIT row count tolerated before flagging.
    pub max_page_size: u64,
}

impl Default for LargePageSizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_page_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingOrderByConfig {
    pub enabled: bool,
}

impl Default for MissingOrderByConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Unpaginated SELECTs on large-volume tables.
///
/// Ships disabled: the rule only makes sense once a deployment names its
/// large tables. When enabled it applies to every table, at the severity
/// from `tables` or `default_risk` for tables not listed there.
/// `exempt_statements` whitelists statement ids with a legitimate need for
/// full-table reads (batch jobs, admin reports).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoPaginationConfig {
    pub enabled: bool,
    pub tables: HashMap<String, RiskLevel>,
    pub default_risk: RiskLevel,
    pub exempt_statements: Vec<String>,
}

impl Default for NoPaginationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tables: HashMap::new(),
            default_risk: RiskLevel::Medium,
            exempt_statements: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();

        assert_eq!(config.parser.mode, ParserMode::Lenient);
        assert!(config.dedup.enabled);
        assert_eq!(config.dedup.capacity, 1000);
        assert_eq!(config.dedup.ttl_ms, 100);
        assert_eq!(config.checkers.deep_pagination.max_offset, 10_000);
        assert_eq!(config.checkers.large_page_size.max_page_size, 1000);
        assert!(config.checkers.no_where_clause.enabled);
        assert!(!config.checkers.no_pagination.enabled);
        assert!(
            config
                .checkers
                .dummy_condition
                .patterns
                .contains(&"1=1".to_string())
        );
        assert!(
            config
                .checkers
                .blacklist_field
                .fields
                .contains(&"create_*".to_string())
        );
    }

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = EngineConfig::default();
        config.dedup.capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(msg)) if msg.contains("capacity")
        ));
    }

    #[test]
    fn empty_dummy_patterns_are_rejected_only_when_enabled() {
        let mut config = EngineConfig::default();
        config.checkers.dummy_condition.patterns.clear();
        assert!(config.validate().is_err());

        config.checkers.dummy_condition.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserializes_partial_toml_over_defaults() {
        let toml = r#"
            [checkers.deep_pagination]
            max_offset = 500

            [checkers.no_pagination]
            enabled = true
            default_risk = "high"

            [checkers.no_pagination.tables]
            orders = "critical"
        "#;
        let config: EngineConfig = toml::from_str(toml).expect("partial config deserializes");

        assert_eq!(config.checkers.deep_pagination.max_offset, 500);
        // Untouched sections keep their defaults
        assert!(config.checkers.deep_pagination.enabled);
        assert_eq!(config.checkers.large_page_size.max_page_size, 1000);
        assert!(config.checkers.no_pagination.enabled);
        assert_eq!(config.checkers.no_pagination.default_risk, RiskLevel::High);
        assert_eq!(
            config.checkers.no_pagination.tables.get("orders"),
            Some(&RiskLevel::Critical)
        );
    }
}
