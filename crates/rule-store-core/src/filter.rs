// crates/rule-store-core/src/filter.rs
// ============================================================================
// Module: Rule Filters
// Description: Positional field filters for rule removal.
// Purpose: Translate (field_index, field_values) into per-column constraints.
// Dependencies: crate::interfaces, crate::rule
// ============================================================================

//! ## Overview
//! A [`RuleFilter`] constrains the policy type and a contiguous run of fields
//! starting at `field_index`. Fields outside the run match any value. An empty
//! constraint value matches only absent fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::interfaces::AdapterError;
use crate::rule::MAX_RULE_FIELDS;
use crate::rule::RuleRow;

// ============================================================================
// SECTION: Rule Filter
// ============================================================================

/// Column constraints for a removal.
///
/// # Invariants
/// - `fields[i]` is `Some` only for `field_index <= i < field_index + len`,
///   except for exact filters, which constrain every field.
/// - At least the policy type is constrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFilter {
    /// Policy type that must match exactly.
    policy_type: String,
    /// Per-field constraints; `None` matches anything.
    fields: [Option<String>; MAX_RULE_FIELDS],
}

impl RuleFilter {
    /// Builds a filter from a field offset and the values that follow it.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidFilter`] when `field_index` is negative,
    /// past the last field, or the values run past the last field.
    pub fn new<S: AsRef<str>>(
        policy_type: &str,
        field_index: isize,
        field_values: &[S],
    ) -> Result<Self, AdapterError> {
        let start = usize::try_from(field_index).map_err(|_| {
            AdapterError::InvalidFilter(format!("field index must not be negative: {field_index}"))
        })?;
        if start >= MAX_RULE_FIELDS {
            return Err(AdapterError::InvalidFilter(format!(
                "field index {start} out of range (max {})",
                MAX_RULE_FIELDS - 1
            )));
        }
        let end = start.saturating_add(field_values.len());
        if end > MAX_RULE_FIELDS {
            return Err(AdapterError::InvalidFilter(format!(
                "{} field values starting at index {start} exceed {MAX_RULE_FIELDS} fields",
                field_values.len()
            )));
        }
        let mut fields: [Option<String>; MAX_RULE_FIELDS] = Default::default();
        for (slot, value) in fields[start .. end].iter_mut().zip(field_values) {
            *slot = Some(value.as_ref().to_string());
        }
        Ok(Self {
            policy_type: policy_type.to_string(),
            fields,
        })
    }

    /// Builds a filter that matches one exact rule.
    ///
    /// Every field is constrained. Fields past the end of `rule` must be
    /// absent, so a longer rule sharing the same prefix is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidFilter`] when the rule has more than
    /// [`MAX_RULE_FIELDS`] fields.
    pub fn exact<S: AsRef<str>>(policy_type: &str, rule: &[S]) -> Result<Self, AdapterError> {
        let mut filter = Self::new(policy_type, 0, rule)?;
        for slot in &mut filter.fields[rule.len() ..] {
            *slot = Some(String::new());
        }
        Ok(filter)
    }

    /// Returns the constrained policy type.
    #[must_use]
    pub fn policy_type(&self) -> &str {
        &self.policy_type
    }

    /// Iterates constrained fields as `(index, value)` pairs in column order.
    pub fn constraints(&self) -> impl Iterator<Item = (usize, &str)> {
        self.fields
            .iter()
            .enumerate()
            .filter_map(|(index, field)| field.as_deref().map(|value| (index, value)))
    }

    /// Returns true when `row` satisfies every constraint.
    #[must_use]
    pub fn matches(&self, row: &RuleRow) -> bool {
        row.policy_type() == self.policy_type
            && self
                .constraints()
                .all(|(index, value)| row.field(index).unwrap_or_default() == value)
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::unwrap_used,
        reason = "Test assertions use expect/unwrap for clarity."
    )]

    use super::RuleFilter;
    use crate::interfaces::AdapterError;
    use crate::rule::RuleRow;

    #[test]
    fn filter_places_values_at_offset() {
        let filter = RuleFilter::new("p", 1, &["room", "write"]).unwrap();
        let constraints: Vec<_> = filter.constraints().collect();
        assert_eq!(constraints, vec![(1, "room"), (2, "write")]);
    }

    #[test]
    fn filter_without_values_matches_whole_type() {
        let empty: [&str; 0] = [];
        let filter = RuleFilter::new("g", 0, &empty).unwrap();
        assert_eq!(filter.constraints().count(), 0);
        assert!(filter.matches(&RuleRow::from_rule("g", &["alice", "admin"]).unwrap()));
        assert!(!filter.matches(&RuleRow::from_rule("p", &["alice", "admin"]).unwrap()));
    }

    #[test]
    fn filter_rejects_negative_index() {
        let err = RuleFilter::new("p", -1, &["alice"]).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidFilter(_)));
    }

    #[test]
    fn filter_rejects_index_past_last_field() {
        let err = RuleFilter::new("p", 6, &["alice"]).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidFilter(_)));
    }

    #[test]
    fn filter_rejects_values_running_past_last_field() {
        let err = RuleFilter::new("p", 4, &["a", "b", "c"]).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidFilter(_)));
        assert!(RuleFilter::new("p", 4, &["a", "b"]).is_ok());
    }

    #[test]
    fn empty_constraint_matches_only_absent_field() {
        let filter = RuleFilter::new("p", 1, &[""]).unwrap();
        assert!(filter.matches(&RuleRow::from_rule("p", &["alice"]).unwrap()));
        assert!(!filter.matches(&RuleRow::from_rule("p", &["alice", "room"]).unwrap()));
    }

    #[test]
    fn exact_filter_matches_only_the_same_rule() {
        let filter = RuleFilter::exact("p", &["alice", "room", "read"]).unwrap();
        assert!(filter.matches(&RuleRow::from_rule("p", &["alice", "room", "read"]).unwrap()));
        assert!(!filter.matches(&RuleRow::from_rule("p", &["alice", "room", "write"]).unwrap()));
        assert!(!filter.matches(&RuleRow::from_rule("p", &["alice", "room"]).unwrap()));
        assert!(
            !filter.matches(&RuleRow::from_rule("p", &["alice", "room", "read", "deny"]).unwrap())
        );
    }

    #[test]
    fn exact_filter_constrains_every_field() {
        let filter = RuleFilter::exact("p", &["alice", "room"]).unwrap();
        let constraints: Vec<_> = filter.constraints().collect();
        assert_eq!(
            constraints,
            vec![(0, "alice"), (1, "room"), (2, ""), (3, ""), (4, ""), (5, "")]
        );
    }
}
