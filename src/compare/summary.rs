//! Structure skeletons and human-readable change summaries

use std::collections::BTreeSet;

use serde_json::{Map, Value as JsonValue};

pub const NO_TOP_LEVEL_CHANGES: &str = "No top-level changes";
pub const KEYS_MATCH: &str = "No structural changes (keys match)";

/// Reduce a value to its shape
///
/// Scalars become type markers and arrays keep only their first element, so
/// two documents with the same keys and types produce equal skeletons.
pub fn skeleton(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), skeleton(v)))
                .collect::<Map<_, _>>(),
        ),
        JsonValue::Array(items) => {
            JsonValue::Array(items.first().map(skeleton).into_iter().collect())
        }
        JsonValue::String(_) => JsonValue::from("<string>"),
        JsonValue::Number(_) => JsonValue::from("<number>"),
        JsonValue::Bool(_) => JsonValue::from("<boolean>"),
        JsonValue::Null => JsonValue::from("<null>"),
    }
}

/// Every key path reachable in `value`
///
/// Nested keys are dot-joined; an array contributes a `[]` segment standing
/// for its first element.
pub fn key_paths(value: &JsonValue) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    collect_key_paths(value, "", &mut paths);
    paths
}

fn collect_key_paths(value: &JsonValue, prefix: &str, paths: &mut BTreeSet<String>) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                let full = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_key_paths(child, &full, paths);
                paths.insert(full);
            }
        }
        JsonValue::Array(items) => {
            if let Some(first) = items.first() {
                collect_key_paths(first, &format!("{prefix}[]"), paths);
            }
        }
        _ => {}
    }
}

/// Summarize key additions and removals between two skeletons
pub fn summarize_keys(left: &JsonValue, right: &JsonValue) -> String {
    let left_keys = key_paths(left);
    let right_keys = key_paths(right);

    let mut changes: Vec<String> = left_keys
        .difference(&right_keys)
        .map(|k| format!("Key '{k}' removed"))
        .chain(
            right_keys
                .difference(&left_keys)
                .map(|k| format!("Key '{k}' added")),
        )
        .collect();
    changes.sort();

    if changes.is_empty() {
        KEYS_MATCH.to_string()
    } else {
        changes.join(", ")
    }
}

/// Summarize top-level differences between two full values
pub fn summarize_values(left: &JsonValue, right: &JsonValue) -> String {
    match (left, right) {
        (JsonValue::Array(l), JsonValue::Array(r)) => summarize_arrays(l, r),
        (JsonValue::Object(l), JsonValue::Object(r)) => summarize_objects(l, r),
        _ if canonical_eq(left, right) => NO_TOP_LEVEL_CHANGES.to_string(),
        _ => "Top-level value changed".to_string(),
    }
}

fn summarize_arrays(left: &[JsonValue], right: &[JsonValue]) -> String {
    if left.len() != right.len() {
        return format!(
            "Array length changed: {} → {} items",
            left.len(),
            right.len()
        );
    }

    let changed = left
        .iter()
        .zip(right)
        .filter(|(l, r)| !canonical_eq(l, r))
        .count();

    if changed == 0 {
        NO_TOP_LEVEL_CHANGES.to_string()
    } else {
        format!("Array: {} of {} items changed", changed, left.len())
    }
}

fn summarize_objects(left: &Map<String, JsonValue>, right: &Map<String, JsonValue>) -> String {
    let mut changes = Vec::new();

    for (key, lv) in left {
        match right.get(key) {
            None => changes.push(format!("Field '{key}' removed")),
            Some(rv) if !canonical_eq(lv, rv) => changes.push(format!("Field '{key}' changed")),
            Some(_) => {}
        }
    }
    for key in right.keys() {
        if !left.contains_key(key) {
            changes.push(format!("Field '{key}' added"));
        }
    }
    changes.sort();

    if changes.is_empty() {
        NO_TOP_LEVEL_CHANGES.to_string()
    } else {
        changes.join(", ")
    }
}

/// Deep equality through canonical serialization
///
/// `1` and `1.0` serialize differently and therefore compare unequal.
pub fn canonical_eq(left: &JsonValue, right: &JsonValue) -> bool {
    match (serde_json::to_string(left), serde_json::to_string(right)) {
        (Ok(l), Ok(r)) => l == r,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skeleton_markers() {
        let value = json!({
            "id": 7,
            "name": "x",
            "active": true,
            "parent": null,
            "tags": ["a", "b"],
            "empty": [],
            "rows": [{"n": 1.5}, {"other": 1}]
        });
        assert_eq!(
            skeleton(&value),
            json!({
                "id": "<number>",
                "name": "<string>",
                "active": "<boolean>",
                "parent": "<null>",
                "tags": ["<string>"],
                "empty": [],
                "rows": [{"n": "<number>"}]
            })
        );
    }

    #[test]
    fn test_key_paths_through_arrays() {
        let paths = key_paths(&json!({"data": [{"id": 1, "meta": {"k": 1}}], "ok": true}));
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        assert_eq!(
            paths,
            vec!["data", "data[].id", "data[].meta", "data[].meta.k", "ok"]
        );

        let paths = key_paths(&json!([{"id": 1}]));
        assert!(paths.contains("[].id"));
    }

    #[test]
    fn test_summarize_keys() {
        assert_eq!(
            summarize_keys(&json!({"a": 1, "b": 2}), &json!({"a": 99, "b": 2})),
            KEYS_MATCH
        );
        assert_eq!(
            summarize_keys(&json!({"a": 1, "b": {"c": 1}}), &json!({"a": 1, "d": 1})),
            "Key 'b' removed, Key 'b.c' removed, Key 'd' added"
        );
    }

    #[test]
    fn test_summarize_objects() {
        assert_eq!(
            summarize_values(&json!({"a": 1}), &json!({"a": 1, "b": 2})),
            "Field 'b' added"
        );
        assert_eq!(
            summarize_values(&json!({"a": 1, "z": [1]}), &json!({"a": 2})),
            "Field 'a' changed, Field 'z' removed"
        );
        assert_eq!(
            summarize_values(&json!({"a": {"x": [1, 2]}}), &json!({"a": {"x": [1, 2]}})),
            NO_TOP_LEVEL_CHANGES
        );
    }

    #[test]
    fn test_summarize_arrays() {
        assert_eq!(
            summarize_values(&json!([1, 2, 3]), &json!([1, 9, 3])),
            "Array: 1 of 3 items changed"
        );
        assert_eq!(
            summarize_values(&json!([1, 2, 3]), &json!([1, 2])),
            "Array length changed: 3 → 2 items"
        );
        assert_eq!(summarize_values(&json!([]), &json!([])), NO_TOP_LEVEL_CHANGES);
    }

    #[test]
    fn test_summarize_scalars_and_mixed() {
        assert_eq!(summarize_values(&json!("a"), &json!("a")), NO_TOP_LEVEL_CHANGES);
        assert_eq!(
            summarize_values(&json!("a"), &json!("b")),
            "Top-level value changed"
        );
        assert_eq!(
            summarize_values(&json!({"a": 1}), &json!([1])),
            "Top-level value changed"
        );
    }

    #[test]
    fn test_canonical_eq_distinguishes_number_formats() {
        assert!(canonical_eq(&json!({"a": [1, "x"]}), &json!({"a": [1, "x"]})));
        assert!(!canonical_eq(&json!(1), &json!(1.0)));
    }
}
