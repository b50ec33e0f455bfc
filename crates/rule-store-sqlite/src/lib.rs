// crates/rule-store-sqlite/src/lib.rs
// ============================================================================
// Module: Rule Store SQLite Library
// Description: Embedded rule table backend.
// Purpose: Open rule store adapters over a local SQLite database.
// Dependencies: rule-store-core, rusqlite, serde
// ============================================================================

//! ## Overview
//! Provides [`SqliteClient`], a [`rule_store_core::SqlClient`] over a single
//! `SQLite` connection, and constructors that return a ready
//! [`RuleStoreAdapter`]. File databases are created on first open; in-memory
//! databases live as long as the adapter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rule_store_core::AdapterError;
use rule_store_core::RuleStoreAdapter;
use rule_store_core::TableName;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::SqliteClient;
pub use config::SqliteJournalMode;
pub use config::SqliteRuleStoreConfig;

// ============================================================================
// SECTION: Constructors
// ============================================================================

/// Rule store adapter over an embedded database.
pub type SqliteAdapter = RuleStoreAdapter<SqliteClient>;

/// Opens the database named by `config` and ensures `table` exists.
///
/// # Errors
///
/// Returns [`AdapterError::Config`] for an invalid path and
/// [`AdapterError::Connection`] when the database cannot be opened or the
/// table cannot be created.
pub fn open(
    config: &SqliteRuleStoreConfig,
    table: TableName,
) -> Result<SqliteAdapter, AdapterError> {
    config.validate()?;
    let client =
        SqliteClient::open(config).map_err(|err| AdapterError::Connection(err.to_string()))?;
    RuleStoreAdapter::open(client, table)
}

/// Opens a private in-memory database and creates `table`.
///
/// # Errors
///
/// Returns [`AdapterError::Connection`] when the database cannot be created.
pub fn open_in_memory(table: TableName) -> Result<SqliteAdapter, AdapterError> {
    let client =
        SqliteClient::open_in_memory().map_err(|err| AdapterError::Connection(err.to_string()))?;
    RuleStoreAdapter::open(client, table)
}
