// crates/rule-store-core/src/statement.rs
// ============================================================================
// Module: Rule Table Statements
// Description: Parameterized SQL for the rule table lifecycle and CRUD.
// Purpose: Keep rule values out of statement text.
// Dependencies: serde, crate::filter, crate::interfaces, crate::rule
// ============================================================================

//! ## Overview
//! Every statement the adapter issues is built here. Rule values are carried
//! as positional `?` parameters. The table name is the only interpolated
//! identifier and [`TableName`] restricts it to a plain SQL identifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::filter::RuleFilter;
use crate::interfaces::AdapterError;
use crate::rule::RULE_COLUMNS;
use crate::rule::RuleRow;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default rule table name.
pub const DEFAULT_TABLE_NAME: &str = "rules";
/// Maximum table name length.
const MAX_TABLE_NAME_LENGTH: usize = 64;

// ============================================================================
// SECTION: Table Name
// ============================================================================

/// Validated rule table identifier.
///
/// # Invariants
/// - Matches `[A-Za-z_][A-Za-z0-9_]*` and is at most 64 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    /// Validates a table name.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Config`] when the name is not a plain identifier.
    pub fn new(name: impl Into<String>) -> Result<Self, AdapterError> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_TABLE_NAME_LENGTH {
            return Err(AdapterError::Config(format!(
                "table name must be 1..={MAX_TABLE_NAME_LENGTH} characters"
            )));
        }
        let mut chars = name.chars();
        let leading_ok = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
        if !leading_ok || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(AdapterError::Config(format!("table name is not an identifier: {name}")));
        }
        Ok(Self(name))
    }

    /// Returns the table name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(DEFAULT_TABLE_NAME.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TableName {
    type Error = AdapterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Statement
// ============================================================================

/// SQL text plus positional text parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text using `?` placeholders.
    pub sql: String,
    /// Parameter values bound in order.
    pub params: Vec<String>,
}

impl Statement {
    /// Creates a statement without parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a statement with parameters.
    #[must_use]
    pub fn with_params(sql: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// `CREATE TABLE IF NOT EXISTS` for the rule table.
#[must_use]
pub fn create_table(table: &TableName) -> Statement {
    let columns =
        RULE_COLUMNS.iter().map(|column| format!("{column} TEXT NULL")).collect::<Vec<_>>();
    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {table} ({}, PRIMARY KEY({}))",
        columns.join(", "),
        RULE_COLUMNS.join(", ")
    ))
}

/// `DROP TABLE IF EXISTS` for the rule table.
#[must_use]
pub fn drop_table(table: &TableName) -> Statement {
    Statement::new(format!("DROP TABLE IF EXISTS {table}"))
}

/// Selects every rule row in column order.
#[must_use]
pub fn select_rules(table: &TableName) -> Statement {
    Statement::new(format!("SELECT {} FROM {table}", RULE_COLUMNS.join(", ")))
}

/// Inserts a row, ignoring a duplicate primary key.
#[must_use]
pub fn insert_rule(table: &TableName, row: &RuleRow) -> Statement {
    let placeholders = vec!["?"; RULE_COLUMNS.len()].join(", ");
    Statement::with_params(
        format!(
            "INSERT OR IGNORE INTO {table} ({}) VALUES ({placeholders})",
            RULE_COLUMNS.join(", ")
        ),
        row.column_values(),
    )
}

/// Deletes every row matching the filter.
#[must_use]
pub fn delete_rules(table: &TableName, filter: &RuleFilter) -> Statement {
    let mut conditions = vec![format!("{} = ?", RULE_COLUMNS[0])];
    let mut params = vec![filter.policy_type().to_string()];
    for (index, value) in filter.constraints() {
        conditions.push(format!("v{index} = ?"));
        params.push(value.to_string());
    }
    Statement::with_params(
        format!("DELETE FROM {table} WHERE {}", conditions.join(" AND ")),
        params,
    )
}

/// Trivial round trip used by readiness probes.
#[must_use]
pub fn ping() -> Statement {
    Statement::new("SELECT 1")
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
    fn table_name_accepts_identifiers() {
        assert_eq!(TableName::new("casbin_rule").unwrap().as_str(), "casbin_rule");
        assert_eq!(TableName::new("_rules2").unwrap().as_str(), "_rules2");
        assert_eq!(TableName::default().as_str(), DEFAULT_TABLE_NAME);
    }

    #[test]
    fn table_name_rejects_sql_fragments() {
        let long = "r".repeat(65);
        for bad in ["", "1rules", "rules; DROP TABLE x", "ru-les", "rules\"", long.as_str()] {
            assert!(matches!(TableName::new(bad), Err(AdapterError::Config(_))), "{bad}");
        }
    }

    #[test]
    fn create_table_matches_rule_schema() {
        let statement = create_table(&TableName::default());
        assert_eq!(
            statement.sql,
            "CREATE TABLE IF NOT EXISTS rules (p_type TEXT NULL, v0 TEXT NULL, v1 TEXT NULL, \
             v2 TEXT NULL, v3 TEXT NULL, v4 TEXT NULL, v5 TEXT NULL, \
             PRIMARY KEY(p_type, v0, v1, v2, v3, v4, v5))"
        );
        assert!(statement.params.is_empty());
    }

    #[test]
    fn insert_binds_every_value() {
        let row = RuleRow::from_rule("p", &["O'Brien", "room"]).unwrap();
        let statement = insert_rule(&TableName::default(), &row);
        assert_eq!(
            statement.sql,
            "INSERT OR IGNORE INTO rules (p_type, v0, v1, v2, v3, v4, v5) \
             VALUES (?, ?, ?, ?, ?, ?, ?)"
        );
        assert!(!statement.sql.contains("O'Brien"));
        assert_eq!(statement.params, vec!["p", "O'Brien", "room", "", "", "", ""]);
    }

    #[test]
    fn delete_constrains_only_filtered_columns() {
        let filter = RuleFilter::new("p", 1, &["room", "write"]).unwrap();
        let statement = delete_rules(&TableName::new("acl").unwrap(), &filter);
        assert_eq!(statement.sql, "DELETE FROM acl WHERE p_type = ? AND v1 = ? AND v2 = ?");
        assert_eq!(statement.params, vec!["p", "room", "write"]);
    }

    #[test]
    fn select_lists_columns_explicitly() {
        assert_eq!(
            select_rules(&TableName::default()).sql,
            "SELECT p_type, v0, v1, v2, v3, v4, v5 FROM rules"
        );
        assert_eq!(drop_table(&TableName::default()).sql, "DROP TABLE IF EXISTS rules");
    }
}
