//! Drift detection helpers
//!
//! Kinds compare their desired parameters with parameters generated from the
//! observed AWS object, both of the same type. Before comparing, set-like
//! lists are put in their declared order with [`sort_set`] and both sides are
//! serialized and normalized so that an unset optional and an empty
//! collection are the same thing.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use crate::error::ControllerError;

/// Put a list with set semantics into its declared total order
pub fn sort_set<T: Ord>(items: &mut [T]) {
    items.sort();
}

/// Observed value of an optional field, `None` when the desired value is unset
///
/// Unset optional fields are owned by AWS and never count as drift.
pub fn when_set<T>(desired: &Option<T>, observed: Option<T>) -> Option<T> {
    desired.as_ref().and(observed)
}

/// Compare desired and current state; the diff names the first differing field
pub fn compare<T: Serialize>(desired: &T, current: &T) -> Result<(bool, String), ControllerError> {
    let desired = normalize(serde_json::to_value(desired)?);
    let current = normalize(serde_json::to_value(current)?);
    match first_difference("spec.forProvider", &desired, &current) {
        None => Ok((true, String::new())),
        Some(diff) => Ok((false, diff)),
    }
}

/// Drop nulls, empty lists and empty objects, recursively
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !is_empty(v))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn first_difference(path: &str, desired: &Value, current: &Value) -> Option<String> {
    match (desired, current) {
        (Value::Object(d), Value::Object(c)) => {
            let keys: BTreeSet<&String> = d.keys().chain(c.keys()).collect();
            keys.into_iter().find_map(|key| {
                let path = format!("{path}.{key}");
                match (d.get(key), c.get(key)) {
                    (Some(dv), Some(cv)) => first_difference(&path, dv, cv),
                    (dv, cv) => Some(describe(&path, dv, cv)),
                }
            })
        }
        (Value::Array(d), Value::Array(c)) => {
            let len = d.len().max(c.len());
            (0..len).find_map(|i| {
                let path = format!("{path}[{i}]");
                match (d.get(i), c.get(i)) {
                    (Some(dv), Some(cv)) => first_difference(&path, dv, cv),
                    (dv, cv) => Some(describe(&path, dv, cv)),
                }
            })
        }
        (d, c) if d == c => None,
        (d, c) => Some(describe(path, Some(d), Some(c))),
    }
}

fn describe(path: &str, desired: Option<&Value>, current: Option<&Value>) -> String {
    let show = |v: Option<&Value>| v.map_or_else(|| "<unset>".to_string(), Value::to_string);
    format!("{path}: desired {}, observed {}", show(desired), show(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::Tag;
    use serde::Serialize;

    #[derive(Serialize, Clone, Default)]
    #[serde(rename_all = "camelCase")]
    struct Params {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        tags: Vec<Tag>,
        subnet_ids: Option<Vec<String>>,
    }

    #[test]
    fn test_equal_values_are_up_to_date() {
        let params = Params {
            description: Some("api".to_string()),
            ..Default::default()
        };
        assert_eq!(compare(&params, &params.clone()).unwrap(), (true, String::new()));
    }

    #[test]
    fn test_unset_equals_empty() {
        let unset = Params::default();
        let empty = Params {
            subnet_ids: Some(Vec::new()),
            ..Default::default()
        };
        assert!(compare(&unset, &empty).unwrap().0);
    }

    #[test]
    fn test_diff_names_first_differing_path() {
        let desired = Params {
            tags: vec![Tag::new("a", "1"), Tag::new("b", "2")],
            ..Default::default()
        };
        let current = Params {
            tags: vec![Tag::new("a", "1"), Tag::new("b", "3")],
            ..Default::default()
        };
        let (up_to_date, diff) = compare(&desired, &current).unwrap();
        assert!(!up_to_date);
        assert_eq!(diff, "spec.forProvider.tags[1].value: desired \"2\", observed \"3\"");
    }

    #[test]
    fn test_missing_field_is_reported_as_unset() {
        let desired = Params {
            description: Some("api".to_string()),
            ..Default::default()
        };
        let (_, diff) = compare(&desired, &Params::default()).unwrap();
        assert_eq!(diff, "spec.forProvider.description: desired \"api\", observed <unset>");
    }

    #[test]
    fn test_when_set_ignores_unset_fields() {
        assert_eq!(when_set(&None::<String>, Some("aws".to_string())), None);
        assert_eq!(when_set(&Some(1), Some(2)), Some(2));
        assert_eq!(when_set(&Some(1), None), None);
    }

    #[test]
    fn test_sorted_sets_compare_equal() {
        let mut desired = vec![Tag::new("b", "2"), Tag::new("a", "1")];
        let mut current = vec![Tag::new("a", "1"), Tag::new("b", "2")];
        sort_set(&mut desired);
        sort_set(&mut current);
        assert_eq!(desired, current);
    }
}
