// crates/rule-store-sqlite/src/client.rs
// ============================================================================
// Module: SQLite Statement Client
// Description: SqlClient implementation over a single rusqlite connection.
// Purpose: Run rule table statements against an embedded database.
// Dependencies: rule-store-core, rusqlite
// ============================================================================

//! ## Overview
//! [`SqliteClient`] owns one connection behind a mutex. Statement parameters
//! are bound positionally and query values are read back as text. Closing
//! takes the connection out of the mutex, so later calls fail with
//! [`SqlClientError::Closed`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rule_store_core::SqlClient;
use rule_store_core::SqlClientError;
use rule_store_core::SqlRow;
use rule_store_core::Statement;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::config::SqliteRuleStoreConfig;

// ============================================================================
// SECTION: Client
// ============================================================================

/// Statement client over an embedded `SQLite` database.
///
/// # Invariants
/// - `connection` is `None` only after [`SqlClient::close`].
pub struct SqliteClient {
    /// Open connection, taken on close.
    connection: Mutex<Option<Connection>>,
}

impl SqliteClient {
    /// Opens (creating if needed) the database file named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SqlClientError::Transport`] when the file or its parent
    /// directory cannot be created or the pragmas cannot be applied.
    pub fn open(config: &SqliteRuleStoreConfig) -> Result<Self, SqlClientError> {
        ensure_parent_dir(&config.path)?;
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(&config.path, flags)
            .map_err(|err| SqlClientError::Transport(err.to_string()))?;
        let journal_mode = config.journal_mode.pragma_value();
        connection
            .execute_batch(&format!("PRAGMA journal_mode = {journal_mode};"))
            .map_err(|err| SqlClientError::Transport(err.to_string()))?;
        connection
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|err| SqlClientError::Transport(err.to_string()))?;
        Ok(Self::from_connection(connection))
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`SqlClientError::Transport`] when `SQLite` cannot allocate it.
    pub fn open_in_memory() -> Result<Self, SqlClientError> {
        let connection = Connection::open_in_memory()
            .map_err(|err| SqlClientError::Transport(err.to_string()))?;
        Ok(Self::from_connection(connection))
    }

    /// Wraps an already open connection.
    #[must_use]
    pub const fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(Some(connection)),
        }
    }

    /// Runs `run` against the open connection.
    fn with_connection<T>(
        &self,
        run: impl FnOnce(&Connection) -> Result<T, SqlClientError>,
    ) -> Result<T, SqlClientError> {
        let guard = self.connection.lock().map_err(|_| poisoned())?;
        let connection = guard.as_ref().ok_or(SqlClientError::Closed)?;
        run(connection)
    }
}

impl SqlClient for SqliteClient {
    fn execute(&self, statement: &Statement) -> Result<u64, SqlClientError> {
        self.with_connection(|connection| {
            let changed = connection
                .execute(&statement.sql, params_from_iter(statement.params.iter()))
                .map_err(|err| SqlClientError::Statement(err.to_string()))?;
            Ok(u64::try_from(changed).unwrap_or(u64::MAX))
        })
    }

    fn query(&self, statement: &Statement) -> Result<Vec<SqlRow>, SqlClientError> {
        self.with_connection(|connection| {
            let mut prepared = connection
                .prepare(&statement.sql)
                .map_err(|err| SqlClientError::Statement(err.to_string()))?;
            let width = prepared.column_count();
            let rows = prepared
                .query_map(params_from_iter(statement.params.iter()), |row| {
                    (0 .. width)
                        .map(|index| row.get::<_, Value>(index))
                        .collect::<rusqlite::Result<Vec<_>>>()
                })
                .map_err(|err| SqlClientError::Statement(err.to_string()))?;
            let mut decoded = Vec::new();
            for row in rows {
                let values = row.map_err(|err| SqlClientError::Statement(err.to_string()))?;
                decoded.push(values.into_iter().map(value_text).collect::<Result<SqlRow, _>>()?);
            }
            Ok(decoded)
        })
    }

    fn close(&self) -> Result<(), SqlClientError> {
        let mut guard = self.connection.lock().map_err(|_| poisoned())?;
        match guard.take() {
            Some(connection) => {
                connection.close().map_err(|(_, err)| SqlClientError::Transport(err.to_string()))
            }
            None => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a column value to optional text.
fn value_text(value: Value) -> Result<Option<String>, SqlClientError> {
    match value {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        Value::Integer(number) => Ok(Some(number.to_string())),
        Value::Real(number) => Ok(Some(number.to_string())),
        Value::Blob(_) => Err(SqlClientError::Decode("blob column is not text".to_string())),
    }
}

/// Error for a poisoned connection mutex.
fn poisoned() -> SqlClientError {
    SqlClientError::Transport("sqlite connection mutex poisoned".to_string())
}

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqlClientError> {
    let Some(parent) = path.parent() else {
        return Err(SqlClientError::Transport("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqlClientError::Transport(err.to_string()))
}
