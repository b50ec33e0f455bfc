// crates/rule-store-core/src/client.rs
// ============================================================================
// Module: Statement Client
// Description: Backend seam for executing rule table statements.
// Purpose: Let the adapter run against any SQL-speaking store.
// Dependencies: thiserror, crate::statement
// ============================================================================

//! ## Overview
//! [`SqlClient`] is the request/response client the adapter drives. It executes
//! one parameterized [`Statement`] per call and returns either an affected-row
//! count or rows of optional text values.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::statement::Statement;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One result row; `None` is SQL NULL.
pub type SqlRow = Vec<Option<String>>;

/// Statement client errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqlClientError {
    /// The store could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
    /// The store answered with a non-success status.
    #[error("unexpected status: {0}")]
    Status(String),
    /// The store rejected the statement.
    #[error("statement failed: {0}")]
    Statement(String),
    /// The store response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// The client has been closed.
    #[error("client is closed")]
    Closed,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Synchronous statement client for a rule table backend.
pub trait SqlClient: Send + Sync {
    /// Executes a write or DDL statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`SqlClientError`] when the statement cannot be executed.
    fn execute(&self, statement: &Statement) -> Result<u64, SqlClientError>;

    /// Executes a read statement and returns its rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqlClientError`] when the query fails or a value is not text.
    fn query(&self, statement: &Statement) -> Result<Vec<SqlRow>, SqlClientError>;

    /// Releases the connection. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns [`SqlClientError`] when the backend fails to release resources.
    fn close(&self) -> Result<(), SqlClientError>;
}
