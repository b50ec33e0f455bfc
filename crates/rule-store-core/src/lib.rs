// crates/rule-store-core/src/lib.rs
// ============================================================================
// Module: Rule Store Core Library
// Description: Rule rows, statements, and the backend-agnostic rule store adapter.
// Purpose: Persist policy-engine rule sets into a relational rule table.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Rule Store Core maps a policy engine's rule set onto a single fixed-width
//! rule table and back. It provides the [`RuleRow`] encoding, the [`RuleSet`]
//! in-memory model, the parameterized statement builder, and
//! [`RuleStoreAdapter`], which implements the [`PolicyAdapter`] contract over
//! any [`SqlClient`].
//! Invariants:
//! - Rule fields are positional; field `i` is always column `v{i}`.
//! - Every rule value reaches the store as a bound parameter.
//! - Duplicate inserts are silent no-ops enforced by the table primary key.
//!
//! Backends live in sibling crates (`rule-store-rqlite`, `rule-store-sqlite`).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod adapter;
pub mod client;
pub mod filter;
pub mod interfaces;
pub mod rule;
pub mod rule_set;
pub mod statement;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use adapter::RuleStoreAdapter;
pub use client::SqlClient;
pub use client::SqlClientError;
pub use client::SqlRow;
pub use filter::RuleFilter;
pub use interfaces::AdapterError;
pub use interfaces::PolicyAdapter;
pub use interfaces::RuleSink;
pub use interfaces::SinkError;
pub use rule::MAX_RULE_FIELDS;
pub use rule::RULE_COLUMNS;
pub use rule::RuleRow;
pub use rule_set::RuleSet;
pub use rule_set::Section;
pub use statement::DEFAULT_TABLE_NAME;
pub use statement::Statement;
pub use statement::TableName;
pub use telemetry::NoopMetrics;
pub use telemetry::StoreMetricEvent;
pub use telemetry::StoreMetrics;
pub use telemetry::StoreOperation;
pub use telemetry::StoreOutcome;
