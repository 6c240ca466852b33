//! Cross-resource references for AWS managed resources
//!
//! A reference site on a record is a value field (the concrete AWS identifier)
//! co-located with two optional ways of computing it:
//! - `<field>Ref`: names another record of the target kind in the same namespace
//! - `<field>Selector`: picks a record of the target kind by its labels
//!
//! The controller resolves these into the value field before every reconciliation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to another managed record by name
///
/// The referenced record lives in the same namespace as the referencing record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Name of the referenced record
    pub name: String,
}

impl Reference {
    /// Create a reference to the record with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Label selector used to pick a referenced record
///
/// When several records match, the one with the lowest name wins and is recorded
/// in the sibling `<field>Ref` so later reconciliations are stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    /// Labels a candidate record must carry (all must match)
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl Selector {
    /// Create a selector matching the given labels
    pub fn with_labels<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            match_labels: labels.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Returns true if every label of the selector is present with the same value
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        self.match_labels.iter().all(|(key, value)| {
            labels
                .and_then(|l| l.get(key))
                .is_some_and(|candidate| candidate == value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matches_subset() {
        let selector = Selector::with_labels([("env", "prod")]);
        let labels: BTreeMap<String, String> = [
            ("env".to_string(), "prod".to_string()),
            ("team".to_string(), "api".to_string()),
        ]
        .into_iter()
        .collect();
        assert!(selector.matches(Some(&labels)));
    }

    #[test]
    fn test_selector_rejects_missing_or_different_label() {
        let selector = Selector::with_labels([("env", "prod")]);
        let labels: BTreeMap<String, String> =
            [("env".to_string(), "dev".to_string())].into_iter().collect();
        assert!(!selector.matches(Some(&labels)));
        assert!(!selector.matches(None));
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        assert!(Selector::default().matches(None));
    }
}
