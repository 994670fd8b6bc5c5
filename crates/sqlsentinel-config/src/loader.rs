//! Configuration loader with multi-source merging

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::{ConfigError, EngineConfig};

/// Project config file name (git-tracked).
const PROJECT_FILE: &str = "sqlsentinel.toml";
/// Local override file name (gitignored).
const LOCAL_FILE: &str = "sqlsentinel.local.toml";

/// Configuration loader with builder pattern.
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir).
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "SQLSENTINEL".to_string(),
        }
    }

    /// Set the project directory.
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "SQLSENTINEL").
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources with proper precedence.
    pub fn load(self) -> Result<EngineConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = EngineConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. Project config (sqlsentinel.toml)
        let project_file = self.project_dir.join(PROJECT_FILE);
        if project_file.exists() {
            builder = builder.add_source(
                config::File::from(project_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 3. Local config (sqlsentinel.local.toml, gitignored)
        let local_file = self.project_dir.join(LOCAL_FILE);
        if local_file.exists() {
            builder = builder.add_source(
                config::File::from(local_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Environment variables (SQLSENTINEL__*). Double separator keeps
        //    snake_case keys like ttl_ms addressable.
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let merged: EngineConfig = builder
            .build()
            .context("failed to merge configuration sources")?
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        merged.validate()?;
        Ok(merged)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads a single TOML file without layering, for callers that manage their
/// own precedence.
pub fn load_file(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: EngineConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}
