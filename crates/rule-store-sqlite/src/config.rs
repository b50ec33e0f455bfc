// crates/rule-store-sqlite/src/config.rs
// ============================================================================
// Module: SQLite Rule Store Config
// Description: Connection settings for the embedded rule table backend.
// Purpose: Validate database paths and connection pragmas before opening.
// Dependencies: serde, rule-store-core
// ============================================================================

//! ## Overview
//! [`SqliteRuleStoreConfig`] names the database file and the pragmas applied to
//! the connection. Paths are checked for length limits and must not name an
//! existing directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use rule_store_core::AdapterError;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// Configuration for the embedded rule table backend.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteRuleStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl SqliteRuleStoreConfig {
    /// Builds a config for `path` with default pragmas.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
        }
    }

    /// Validates the database path.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Config`] when the path is empty, too long, or a
    /// directory.
    pub fn validate(&self) -> Result<(), AdapterError> {
        validate_store_path(&self.path)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), AdapterError> {
    if path.as_os_str().is_empty() {
        return Err(AdapterError::Config("store path must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(AdapterError::Config("store path exceeds length limit".to_string()));
    }
    let overlong = path.components().any(|component| {
        component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH
    });
    if overlong {
        return Err(AdapterError::Config("store path contains an overlong component".to_string()));
    }
    if path.is_dir() {
        return Err(AdapterError::Config("store path must be a file, not a directory".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test assertions use expect/unwrap for clarity."
    )]

    use super::*;

    #[test]
    fn new_uses_default_pragmas() {
        let config = SqliteRuleStoreConfig::new("rules.db");
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(config.journal_mode.pragma_value(), "wal");
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_and_directory_paths() {
        assert!(matches!(SqliteRuleStoreConfig::new("").validate(), Err(AdapterError::Config(_))));
        let dir = std::env::temp_dir();
        assert!(matches!(SqliteRuleStoreConfig::new(dir).validate(), Err(AdapterError::Config(_))));
    }

    #[test]
    fn validate_rejects_overlong_component() {
        let long = "r".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let config = SqliteRuleStoreConfig::new(Path::new("db").join(long));
        assert!(matches!(config.validate(), Err(AdapterError::Config(_))));
    }
}
