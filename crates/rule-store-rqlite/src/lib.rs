// crates/rule-store-rqlite/src/lib.rs
// ============================================================================
// Module: Rule Store rqlite Library
// Description: Networked rule table backend over rqlite.
// Purpose: Open rule store adapters against an rqlite node.
// Dependencies: rule-store-core, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! Provides [`RqliteClient`], a [`rule_store_core::SqlClient`] for the rqlite
//! HTTP API, and the [`open`] constructor that connects, verifies the node, and
//! creates the rule table before returning an adapter.
//! Invariants:
//! - A returned adapter has reached the node and its rule table exists.
//! - Any failure while opening is reported as [`AdapterError::Connection`].

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

pub use client::RqliteClient;
pub use config::DEFAULT_RQLITE_ADDRESS;
pub use config::ReadConsistency;
pub use config::RqliteConfig;

// ============================================================================
// SECTION: Constructors
// ============================================================================

/// Rule store adapter over an rqlite node.
pub type RqliteAdapter = RuleStoreAdapter<RqliteClient>;

/// Connects to the rqlite node at `address` using the default table name.
///
/// # Errors
///
/// Returns [`AdapterError::Connection`] when the address is malformed, the
/// node is unreachable, or the rule table cannot be created.
pub fn open(address: &str) -> Result<RqliteAdapter, AdapterError> {
    open_with_config(&RqliteConfig::new(address), TableName::default())
}

/// Connects with explicit settings and table name.
///
/// # Errors
///
/// Returns [`AdapterError::Config`] for invalid static settings and
/// [`AdapterError::Connection`] when connecting or creating the table fails.
pub fn open_with_config(
    config: &RqliteConfig,
    table: TableName,
) -> Result<RqliteAdapter, AdapterError> {
    config.validate()?;
    let client =
        RqliteClient::connect(config).map_err(|err| AdapterError::Connection(err.to_string()))?;
    RuleStoreAdapter::open(client, table)
}
