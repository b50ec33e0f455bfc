// crates/rule-store-core/src/rule_set.rs
// ============================================================================
// Module: Rule Set
// Description: In-memory policy and grouping rules keyed by section and type.
// Purpose: Provide the rule set saved by the adapter and a reference sink.
// Dependencies: serde, crate::interfaces, crate::rule
// ============================================================================

//! ## Overview
//! A [`RuleSet`] maps a [`Section`] to policy types and each policy type to an
//! ordered list of rules. It implements [`RuleSink`] with the policy-line
//! grammar the adapter emits, so a load can rebuild a set directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::interfaces::RuleSink;
use crate::interfaces::SinkError;
use crate::rule::MAX_RULE_FIELDS;

// ============================================================================
// SECTION: Section
// ============================================================================

/// Top-level grouping of policy types.
///
/// # Invariants
/// - Variants are ordered policy before grouping; saves follow that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    /// Permission statements (`p`).
    #[serde(rename = "p")]
    Policy,
    /// Role and grouping statements (`g`).
    #[serde(rename = "g")]
    Grouping,
}

impl Section {
    /// Resolves the section a policy type belongs to from its first character.
    #[must_use]
    pub fn for_policy_type(policy_type: &str) -> Option<Self> {
        match policy_type.chars().next() {
            Some('p') => Some(Self::Policy),
            Some('g') => Some(Self::Grouping),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Rule Set
// ============================================================================

/// Rules grouped by section and policy type.
///
/// # Invariants
/// - A rule appears at most once per policy type.
/// - Rule order within a policy type is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Section -> policy type -> rules.
    sections: BTreeMap<Section, BTreeMap<String, Vec<Vec<String>>>>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule. Returns false when the rule was already present.
    pub fn add_rule(
        &mut self,
        section: Section,
        policy_type: impl Into<String>,
        rule: Vec<String>,
    ) -> bool {
        let rules =
            self.sections.entry(section).or_default().entry(policy_type.into()).or_default();
        if rules.contains(&rule) {
            return false;
        }
        rules.push(rule);
        true
    }

    /// Adds a rule and returns the set, for building fixtures.
    #[must_use]
    pub fn with_rule<S: AsRef<str>>(
        mut self,
        section: Section,
        policy_type: &str,
        rule: &[S],
    ) -> Self {
        let rule = rule.iter().map(|field| field.as_ref().to_string()).collect();
        self.add_rule(section, policy_type, rule);
        self
    }

    /// Removes a rule. Returns false when it was not present.
    pub fn remove_rule(&mut self, section: Section, policy_type: &str, rule: &[String]) -> bool {
        let Some(rules) =
            self.sections.get_mut(&section).and_then(|types| types.get_mut(policy_type))
        else {
            return false;
        };
        let before = rules.len();
        rules.retain(|existing| existing.as_slice() != rule);
        before != rules.len()
    }

    /// Returns true when the rule is present.
    #[must_use]
    pub fn contains(&self, section: Section, policy_type: &str, rule: &[String]) -> bool {
        self.rules(section, policy_type).iter().any(|existing| existing.as_slice() == rule)
    }

    /// Returns the rules stored for a policy type.
    #[must_use]
    pub fn rules(&self, section: Section, policy_type: &str) -> &[Vec<String>] {
        self.sections
            .get(&section)
            .and_then(|types| types.get(policy_type))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates the policy types present in a section.
    pub fn policy_types(&self, section: Section) -> impl Iterator<Item = &str> {
        self.sections.get(&section).into_iter().flat_map(|types| types.keys().map(String::as_str))
    }

    /// Iterates every rule as `(section, policy_type, rule)` in section order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &str, &[String])> {
        self.sections.iter().flat_map(|(section, types)| {
            types.iter().flat_map(move |(policy_type, rules)| {
                rules.iter().map(move |rule| (*section, policy_type.as_str(), rule.as_slice()))
            })
        })
    }

    /// Returns the total number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.values().flat_map(BTreeMap::values).map(Vec::len).sum()
    }

    /// Returns true when the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RuleSink for RuleSet {
    fn load_policy_line(&mut self, line: &str) -> Result<(), SinkError> {
        let Some((policy_type, rule)) = parse_policy_line(line)? else {
            return Ok(());
        };
        let section = Section::for_policy_type(&policy_type)
            .ok_or_else(|| SinkError::UnknownSection(policy_type.clone()))?;
        self.add_rule(section, policy_type, rule);
        Ok(())
    }
}

// ============================================================================
// SECTION: Line Parsing
// ============================================================================

/// Splits a policy line into its policy type and fields.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
///
/// # Errors
///
/// Returns [`SinkError::Malformed`] when the policy type is empty or the line
/// has more than [`MAX_RULE_FIELDS`] fields.
pub fn parse_policy_line(line: &str) -> Result<Option<(String, Vec<String>)>, SinkError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let mut segments = trimmed.split(',').map(str::trim);
    let policy_type = segments.next().unwrap_or_default();
    if policy_type.is_empty() {
        return Err(SinkError::Malformed("missing policy type".to_string()));
    }
    let rule: Vec<String> = segments.map(str::to_string).collect();
    if rule.len() > MAX_RULE_FIELDS {
        return Err(SinkError::Malformed(format!(
            "line has {} fields (max {MAX_RULE_FIELDS})",
            rule.len()
        )));
    }
    Ok(Some((policy_type.to_string(), rule)))
}
