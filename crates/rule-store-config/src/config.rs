// crates/rule-store-config/src/config.rs
// ============================================================================
// Module: Rule Store Configuration
// Description: TOML configuration for choosing and opening a rule store.
// Purpose: Load, validate, and apply rule store settings.
// Dependencies: rule-store-core, rule-store-rqlite, rule-store-sqlite, serde,
//               thiserror, toml
// ============================================================================

//! ## Overview
//! [`RuleStoreConfig`] names the rule table and one backend. Files are
//! resolved from an explicit path, then `RULE_STORE_CONFIG`, then
//! `rule-store.toml` in the working directory. Loading is size-limited,
//! UTF-8 only, rejects unknown fields, and validates before returning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use rule_store_core::AdapterError;
use rule_store_core::PolicyAdapter;
use rule_store_core::TableName;
use rule_store_rqlite::RqliteConfig;
use rule_store_sqlite::SqliteRuleStoreConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default config file name.
const DEFAULT_CONFIG_NAME: &str = "rule-store.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "RULE_STORE_CONFIG";
/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Rule store configuration.
///
/// # Invariants
/// - `table_name` is a plain SQL identifier.
/// - Exactly one backend is configured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleStoreConfig {
    /// Rule table name.
    #[serde(default)]
    pub table_name: TableName,
    /// Backend selection and settings.
    pub backend: BackendConfig,
}

/// Backend selection, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Networked rqlite node.
    Rqlite(RqliteConfig),
    /// Embedded `SQLite` database file.
    Sqlite(SqliteRuleStoreConfig),
}

impl BackendConfig {
    /// Returns the backend label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Rqlite(_) => "rqlite",
            Self::Sqlite(_) => "sqlite",
        }
    }
}

impl RuleStoreConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when backend settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = match &self.backend {
            BackendConfig::Rqlite(config) => config.validate(),
            BackendConfig::Sqlite(config) => config.validate(),
        };
        result.map_err(|err| {
            ConfigError::Invalid(format!("{} backend: {err}", self.backend.kind()))
        })
    }

    /// Opens the configured backend and returns a ready adapter.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the backend cannot be opened.
    pub fn open_adapter(&self) -> Result<Box<dyn PolicyAdapter>, AdapterError> {
        let table = self.table_name.clone();
        let adapter: Box<dyn PolicyAdapter> = match &self.backend {
            BackendConfig::Rqlite(config) => {
                Box::new(rule_store_rqlite::open_with_config(config, table)?)
            }
            BackendConfig::Sqlite(config) => Box::new(rule_store_sqlite::open(config, table)?),
        };
        Ok(adapter)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}
