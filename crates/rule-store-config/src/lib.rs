// crates/rule-store-config/src/lib.rs
// ============================================================================
// Module: Rule Store Config Library
// Description: Configuration model and backend selection for rule stores.
// Purpose: Turn a TOML file into a ready policy adapter.
// Dependencies: rule-store-core, rule-store-rqlite, rule-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Loads [`RuleStoreConfig`] from TOML and opens the configured backend as a
//! boxed [`rule_store_core::PolicyAdapter`].
//!
//! ```toml
//! table_name = "rules"
//!
//! [backend]
//! kind = "rqlite"
//! address = "http://127.0.0.1:4001"
//! read_consistency = "weak"
//! ```

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::BackendConfig;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::MAX_CONFIG_FILE_SIZE;
pub use config::RuleStoreConfig;
