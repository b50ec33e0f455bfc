// crates/rule-store-sqlite/tests/sqlite_adapter.rs
// ============================================================================
// Module: SQLite Rule Store Adapter Tests
// Description: End-to-end adapter behavior against a real SQLite database.
// Purpose: Validate round trips, idempotence, filtered removal, and lifecycle.
// ============================================================================

//! ## Overview
//! Integration tests for the rule store adapter over the embedded backend:
//! - Save/load round trips and the end-to-end replace scenario
//! - Duplicate suppression for adds and saves
//! - Filtered and exact removal semantics
//! - Absent-field encoding and quoting of rule values
//! - Table isolation, persistence across reopen, and close/drop lifecycle

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;
use std::sync::Arc;
use std::thread;

use rule_store_core::AdapterError;
use rule_store_core::PolicyAdapter;
use rule_store_core::RuleSet;
use rule_store_core::Section;
use rule_store_core::TableName;
use rule_store_sqlite::SqliteAdapter;
use rule_store_sqlite::SqliteRuleStoreConfig;
use rusqlite::Connection;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn open_file(path: &Path, table: &str) -> SqliteAdapter {
    rule_store_sqlite::open(&SqliteRuleStoreConfig::new(path), TableName::new(table).unwrap())
        .unwrap()
}

fn open_memory() -> SqliteAdapter {
    rule_store_sqlite::open_in_memory(TableName::default()).unwrap()
}

fn three_rules() -> RuleSet {
    RuleSet::new()
        .with_rule(Section::Policy, "p", &["alice", "room", "read"])
        .with_rule(Section::Policy, "p", &["alice", "room", "write"])
        .with_rule(Section::Policy, "p", &["bob", "room", "read"])
}

fn policy_rules(adapter: &SqliteAdapter) -> Vec<Vec<String>> {
    let mut rules = adapter.load_rule_set().unwrap().rules(Section::Policy, "p").to_vec();
    rules.sort();
    rules
}

// ============================================================================
// SECTION: Round Trips
// ============================================================================

#[test]
fn save_then_load_round_trips_policies_and_groupings() {
    let adapter = open_memory();
    let rules = RuleSet::new()
        .with_rule(Section::Policy, "p", &["alice", "data1", "read"])
        .with_rule(Section::Policy, "p2", &["bob", "data2", "write", "allow"])
        .with_rule(Section::Grouping, "g", &["alice", "admin"])
        .with_rule(Section::Grouping, "g2", &["data1", "group1"]);
    adapter.save_policy(&rules).unwrap();
    assert_eq!(adapter.load_rule_set().unwrap(), rules);
}

#[test]
fn save_then_load_into_empty_set_yields_exactly_saved_rule() {
    let adapter = open_memory();
    adapter.add_policy("p", "p", &strings(&["stale", "rule"])).unwrap();
    let rules = RuleSet::new().with_rule(Section::Policy, "p", &["resident", "room", "read"]);
    adapter.save_policy(&rules).unwrap();

    let mut loaded = RuleSet::new();
    adapter.load_policy(&mut loaded).unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded.contains(Section::Policy, "p", &strings(&["resident", "room", "read"])));
}

#[test]
fn load_from_empty_table_adds_nothing() {
    let adapter = open_memory();
    assert!(adapter.load_rule_set().unwrap().is_empty());
}

#[test]
fn save_of_empty_set_clears_table() {
    let adapter = open_memory();
    adapter.save_policy(&three_rules()).unwrap();
    adapter.save_policy(&RuleSet::new()).unwrap();
    assert!(adapter.load_rule_set().unwrap().is_empty());
}

// ============================================================================
// SECTION: Idempotence
// ============================================================================

#[test]
fn add_is_idempotent() {
    let adapter = open_memory();
    let rule = strings(&["alice", "room", "read"]);
    adapter.add_policy("p", "p", &rule).unwrap();
    adapter.add_policy("p", "p", &rule).unwrap();
    assert_eq!(policy_rules(&adapter), vec![rule]);
}

#[test]
fn save_is_idempotent() {
    let adapter = open_memory();
    adapter.save_policy(&three_rules()).unwrap();
    let first = adapter.load_rule_set().unwrap();
    adapter.save_policy(&three_rules()).unwrap();
    assert_eq!(adapter.load_rule_set().unwrap(), first);
    assert_eq!(first.len(), 3);
}

// ============================================================================
// SECTION: Removal
// ============================================================================

#[test]
fn remove_filtered_constrains_from_field_index() {
    let adapter = open_memory();
    adapter.save_policy(&three_rules()).unwrap();

    adapter.remove_filtered_policy("p", "p", 1, &strings(&["room", "write"])).unwrap();
    assert_eq!(policy_rules(&adapter), vec![
        strings(&["alice", "room", "read"]),
        strings(&["bob", "room", "read"]),
    ]);

    adapter.save_policy(&three_rules()).unwrap();
    adapter.remove_filtered_policy("p", "p", 0, &strings(&["alice"])).unwrap();
    assert_eq!(policy_rules(&adapter), vec![strings(&["bob", "room", "read"])]);
}

#[test]
fn remove_filtered_with_no_values_deletes_whole_policy_type() {
    let adapter = open_memory();
    let rules = three_rules().with_rule(Section::Grouping, "g", &["alice", "admin"]);
    adapter.save_policy(&rules).unwrap();
    adapter.remove_filtered_policy("p", "p", 0, &[]).unwrap();
    let loaded = adapter.load_rule_set().unwrap();
    assert_eq!(loaded.len(), 1);
    assert!(loaded.contains(Section::Grouping, "g", &strings(&["alice", "admin"])));
}

#[test]
fn remove_filtered_empty_value_matches_only_absent_field() {
    let adapter = open_memory();
    adapter.add_policy("p", "p", &strings(&["alice", "room"])).unwrap();
    adapter.add_policy("p", "p", &strings(&["alice", "room", "read"])).unwrap();
    adapter.remove_filtered_policy("p", "p", 2, &strings(&[""])).unwrap();
    assert_eq!(policy_rules(&adapter), vec![strings(&["alice", "room", "read"])]);
}

#[test]
fn remove_filtered_rejects_out_of_range_index() {
    let adapter = open_memory();
    adapter.save_policy(&three_rules()).unwrap();
    let cases = [(-1, strings(&["alice"])), (6, Vec::new()), (4, strings(&["a", "b", "c"]))];
    for (index, values) in cases {
        let err = adapter.remove_filtered_policy("p", "p", index, &values).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidFilter(_)), "{index}");
    }
    assert_eq!(policy_rules(&adapter).len(), 3);
}

#[test]
fn remove_policy_deletes_matching_rule() {
    let adapter = open_memory();
    adapter.save_policy(&three_rules()).unwrap();
    adapter.remove_policy("p", "p", &strings(&["alice", "room", "write"])).unwrap();
    assert_eq!(policy_rules(&adapter), vec![
        strings(&["alice", "room", "read"]),
        strings(&["bob", "room", "read"]),
    ]);
}

#[test]
fn remove_policy_keeps_longer_rule_with_same_prefix() {
    let adapter = open_memory();
    adapter.add_policy("p", "p", &strings(&["alice", "room"])).unwrap();
    adapter.add_policy("p", "p", &strings(&["alice", "room", "read"])).unwrap();
    adapter.remove_policy("p", "p", &strings(&["alice", "room"])).unwrap();
    assert_eq!(policy_rules(&adapter), vec![strings(&["alice", "room", "read"])]);

    adapter.add_policy("p", "p", &strings(&["alice", "room"])).unwrap();
    adapter.remove_policy("p", "p", &strings(&["alice", "room", "read"])).unwrap();
    assert_eq!(policy_rules(&adapter), vec![strings(&["alice", "room"])]);
}

#[test]
fn removing_missing_rule_is_noop() {
    let adapter = open_memory();
    adapter.save_policy(&three_rules()).unwrap();
    adapter.remove_policy("p", "p", &strings(&["carol", "room", "read"])).unwrap();
    adapter.remove_filtered_policy("p", "p", 0, &strings(&["carol"])).unwrap();
    assert_eq!(policy_rules(&adapter).len(), 3);
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

#[test]
fn short_rules_load_without_trailing_fields() {
    let adapter = open_memory();
    adapter.add_policy("p", "p", &strings(&["alice", "room"])).unwrap();
    assert_eq!(policy_rules(&adapter), vec![strings(&["alice", "room"])]);
}

#[test]
fn absent_fields_are_stored_as_empty_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.db");
    let adapter = open_file(&path, "rules");
    adapter.add_policy("p", "p", &strings(&["alice", "room"])).unwrap();
    adapter.add_policy("p", "p", &strings(&["alice", "room"])).unwrap();
    adapter.close().unwrap();

    let connection = Connection::open(&path).unwrap();
    let (count, nulls): (i64, i64) = connection
        .query_row(
            "SELECT COUNT(*), SUM(v2 IS NULL) FROM rules WHERE p_type = 'p'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!((count, nulls), (1, 0));
}

#[test]
fn quoted_values_survive_round_trip() {
    let adapter = open_memory();
    let rule = strings(&["O'Brien", "room \"A\"", "read; DROP TABLE rules"]);
    adapter.add_policy("p", "p", &rule).unwrap();
    assert_eq!(policy_rules(&adapter), vec![rule]);
    adapter.remove_filtered_policy("p", "p", 0, &strings(&["O'Brien"])).unwrap();
    assert!(adapter.load_rule_set().unwrap().is_empty());
}

#[test]
fn rules_wider_than_six_fields_are_rejected() {
    let adapter = open_memory();
    let err = adapter
        .add_policy("p", "p", &strings(&["a", "b", "c", "d", "e", "f", "g"]))
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidRule(_)));
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

#[test]
fn tables_are_isolated_by_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.db");
    let first = open_file(&path, "tenant_a");
    let second = open_file(&path, "tenant_b");
    first.add_policy("p", "p", &strings(&["alice", "room", "read"])).unwrap();
    assert!(second.load_rule_set().unwrap().is_empty());
    second.save_policy(&RuleSet::new()).unwrap();
    assert_eq!(first.load_rule_set().unwrap().len(), 1);
}

#[test]
fn rules_persist_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("rules.db");
    {
        let adapter = open_file(&path, "rules");
        adapter.save_policy(&three_rules()).unwrap();
    }
    let reopened = open_file(&path, "rules");
    assert_eq!(reopened.load_rule_set().unwrap(), three_rules());
}

#[test]
fn open_rejects_directory_path() {
    let dir = TempDir::new().unwrap();
    let config = SqliteRuleStoreConfig::new(dir.path());
    let err = rule_store_sqlite::open(&config, TableName::default()).err().unwrap();
    assert!(matches!(err, AdapterError::Config(_)));
}

#[test]
fn close_is_idempotent_and_blocks_operations() {
    let adapter = open_memory();
    adapter.readiness().unwrap();
    adapter.close().unwrap();
    adapter.close().unwrap();
    assert!(matches!(adapter.readiness(), Err(AdapterError::Connection(_))));
    assert!(matches!(
        adapter.add_policy("p", "p", &strings(&["alice"])),
        Err(AdapterError::Connection(_))
    ));
}

#[test]
fn concurrent_adds_all_land() {
    let adapter = Arc::new(open_memory());
    let handles: Vec<_> = (0 .. 8)
        .map(|worker| {
            let adapter = Arc::clone(&adapter);
            thread::spawn(move || {
                for item in 0 .. 10 {
                    let rule = vec![format!("user{worker}"), format!("doc{item}"), "read".into()];
                    adapter.add_policy("p", "p", &rule).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(adapter.load_rule_set().unwrap().len(), 80);
}
