// crates/rule-store-core/src/rule.rs
// ============================================================================
// Module: Rule Rows
// Description: Fixed-width row encoding for variable-arity policy rules.
// Purpose: Convert engine rules to table rows and rows back to policy lines.
// Dependencies: crate::interfaces, crate::client
// ============================================================================

//! ## Overview
//! A [`RuleRow`] is a policy type plus [`MAX_RULE_FIELDS`] positional fields.
//! Fields past the supplied rule length are absent. Absent and empty fields are
//! the same value: both are written as the empty string and both are trimmed
//! from the end of a decoded policy line.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::client::SqlRow;
use crate::interfaces::AdapterError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of positional fields a rule may carry.
pub const MAX_RULE_FIELDS: usize = 6;

/// Rule table columns in storage order.
pub const RULE_COLUMNS: [&str; MAX_RULE_FIELDS + 1] =
    ["p_type", "v0", "v1", "v2", "v3", "v4", "v5"];

/// Separator between segments of a policy line.
const LINE_SEPARATOR: &str = ", ";

// ============================================================================
// SECTION: Rule Row
// ============================================================================

/// One persisted rule.
///
/// # Invariants
/// - `policy_type` is non-empty.
/// - `fields[i]` is `None` when field `i` is absent or empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleRow {
    /// Policy type (for example `p` or `g`).
    policy_type: String,
    /// Positional rule fields.
    fields: [Option<String>; MAX_RULE_FIELDS],
}

impl RuleRow {
    /// Encodes an engine rule into a row.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRule`] when the policy type is empty or
    /// the rule has more than [`MAX_RULE_FIELDS`] fields.
    pub fn from_rule<S: AsRef<str>>(policy_type: &str, rule: &[S]) -> Result<Self, AdapterError> {
        if policy_type.is_empty() {
            return Err(AdapterError::InvalidRule("policy type must not be empty".to_string()));
        }
        if rule.len() > MAX_RULE_FIELDS {
            return Err(AdapterError::InvalidRule(format!(
                "rule has {} fields (max {MAX_RULE_FIELDS})",
                rule.len()
            )));
        }
        let mut fields: [Option<String>; MAX_RULE_FIELDS] = Default::default();
        for (slot, value) in fields.iter_mut().zip(rule) {
            *slot = non_empty(value.as_ref());
        }
        Ok(Self {
            policy_type: policy_type.to_string(),
            fields,
        })
    }

    /// Decodes a row read from the rule table.
    ///
    /// NULL columns are treated as absent fields.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Query`] when the row does not have exactly
    /// [`RULE_COLUMNS`] columns or its policy type is missing.
    pub fn from_columns(columns: SqlRow) -> Result<Self, AdapterError> {
        if columns.len() != RULE_COLUMNS.len() {
            return Err(AdapterError::Query(format!(
                "rule row has {} columns (expected {})",
                columns.len(),
                RULE_COLUMNS.len()
            )));
        }
        let mut values = columns.into_iter();
        let policy_type = values
            .next()
            .flatten()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AdapterError::Query("rule row is missing p_type".to_string()))?;
        let mut fields: [Option<String>; MAX_RULE_FIELDS] = Default::default();
        for (slot, value) in fields.iter_mut().zip(values) {
            *slot = value.filter(|value| !value.is_empty());
        }
        Ok(Self {
            policy_type,
            fields,
        })
    }

    /// Returns the policy type.
    #[must_use]
    pub fn policy_type(&self) -> &str {
        &self.policy_type
    }

    /// Returns field `index`, or `None` when absent or out of range.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).and_then(Option::as_deref)
    }

    /// Returns the number of fields up to and including the last present one.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.fields.iter().rposition(Option::is_some).map_or(0, |last| last + 1)
    }

    /// Builds the policy line handed to a [`crate::RuleSink`].
    #[must_use]
    pub fn to_policy_line(&self) -> String {
        let mut line = self.policy_type.clone();
        for field in &self.fields[.. self.arity()] {
            line.push_str(LINE_SEPARATOR);
            line.push_str(field.as_deref().unwrap_or_default());
        }
        line
    }

    /// Returns the statement parameters for all seven columns.
    ///
    /// Absent fields bind as the empty string, never NULL: NULLs compare as
    /// distinct in a primary key and would let duplicate rules in.
    #[must_use]
    pub fn column_values(&self) -> Vec<String> {
        let mut values = Vec::with_capacity(RULE_COLUMNS.len());
        values.push(self.policy_type.clone());
        values.extend(self.fields.iter().map(|field| field.clone().unwrap_or_default()));
        values
    }
}

/// Maps empty strings to `None`.
fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_string()) }
}
