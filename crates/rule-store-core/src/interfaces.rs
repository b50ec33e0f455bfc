// crates/rule-store-core/src/interfaces.rs
// ============================================================================
// Module: Rule Store Interfaces
// Description: Contract surfaces between the policy engine and rule storage.
// Purpose: Define the adapter contract, the rule sink, and their errors.
// Dependencies: thiserror, crate::rule_set
// ============================================================================

//! ## Overview
//! The policy engine consumes storage through [`PolicyAdapter`] and receives
//! loaded rules through [`RuleSink`]. Implementations return every failure to
//! the caller; nothing is retried, logged, or suppressed at this layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::rule_set::RuleSet;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Rule store adapter errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages never embed rule field values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Backing store is unreachable, misaddressed, or the adapter is closed.
    #[error("rule store connection error: {0}")]
    Connection(String),
    /// Reading rules from the store failed.
    #[error("rule store query error: {0}")]
    Query(String),
    /// Writing, deleting, or recreating rules failed.
    #[error("rule store write error: {0}")]
    Write(String),
    /// The rule sink rejected a loaded rule line.
    #[error("rule sink error: {0}")]
    Sink(String),
    /// A rule could not be encoded into a row.
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    /// A removal filter violates the field index contract.
    #[error("invalid rule filter: {0}")]
    InvalidFilter(String),
    /// Adapter configuration is invalid.
    #[error("invalid rule store config: {0}")]
    Config(String),
}

impl AdapterError {
    /// Returns a stable label for telemetry.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Query(_) => "query",
            Self::Write(_) => "write",
            Self::Sink(_) => "sink",
            Self::InvalidRule(_) => "invalid_rule",
            Self::InvalidFilter(_) => "invalid_filter",
            Self::Config(_) => "config",
        }
    }
}

/// Errors raised by a [`RuleSink`] while parsing a policy line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The line is not a well-formed policy line.
    #[error("malformed policy line: {0}")]
    Malformed(String),
    /// The policy type does not belong to a known section.
    #[error("unknown policy section for type {0}")]
    UnknownSection(String),
}

// ============================================================================
// SECTION: Rule Sink
// ============================================================================

/// Receives decoded policy lines during a load.
///
/// A line is the policy type followed by its fields, joined with `", "`
/// (for example `p, alice, room, read`). Fields are not escaped: a field
/// containing a comma splits into extra fields, and surrounding whitespace on
/// a field is trimmed by the line grammar, so such fields do not load back
/// unchanged.
pub trait RuleSink {
    /// Parses one policy line into the sink's rule structures.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the line cannot be accepted. The load aborts.
    fn load_policy_line(&mut self, line: &str) -> Result<(), SinkError>;
}

// ============================================================================
// SECTION: Policy Adapter
// ============================================================================

/// Storage contract consumed by the policy engine.
///
/// `section` arguments are informational; rows are keyed by policy type only.
pub trait PolicyAdapter: Send + Sync {
    /// Streams every stored rule into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Query`] on read or decode failure and
    /// [`AdapterError::Sink`] when the sink rejects a line. Lines already
    /// forwarded are not rolled back.
    fn load_policy(&self, sink: &mut dyn RuleSink) -> Result<(), AdapterError>;

    /// Replaces the stored rules with every `p` and `g` rule in `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRule`] before touching the store when a
    /// rule cannot be encoded, and [`AdapterError::Write`] when any statement
    /// fails. After a write failure the table may be partially populated.
    fn save_policy(&self, rules: &RuleSet) -> Result<(), AdapterError>;

    /// Adds one rule. Adding an existing rule succeeds without change.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRule`] or [`AdapterError::Write`].
    fn add_policy(
        &self,
        section: &str,
        policy_type: &str,
        rule: &[String],
    ) -> Result<(), AdapterError>;

    /// Removes one exact rule.
    ///
    /// Fields past the end of `rule` must be absent in the stored row, so a
    /// longer rule sharing the same prefix is kept.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidFilter`] or [`AdapterError::Write`].
    fn remove_policy(
        &self,
        section: &str,
        policy_type: &str,
        rule: &[String],
    ) -> Result<(), AdapterError>;

    /// Removes every rule of `policy_type` whose fields starting at
    /// `field_index` equal `field_values`. Other fields match anything.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidFilter`] for a negative or out-of-range
    /// field index, and [`AdapterError::Write`] on store failure.
    fn remove_filtered_policy(
        &self,
        section: &str,
        policy_type: &str,
        field_index: isize,
        field_values: &[String],
    ) -> Result<(), AdapterError>;

    /// Releases the store connection. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Connection`] when the backend fails to close.
    fn close(&self) -> Result<(), AdapterError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), AdapterError> {
        Ok(())
    }
}
