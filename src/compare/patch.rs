//! Structural patch between two JSON documents
//!
//! Produces RFC 6902 `add` / `remove` / `replace` operations that turn the
//! left document into the right one. Operations are emitted in an order that
//! stays valid when applied sequentially: array removals run from the highest
//! index down.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One JSON Patch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: JsonValue },
    Remove { path: String },
    Replace { path: String, value: JsonValue },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Remove { path } | Self::Replace { path, .. } => path,
        }
    }
}

/// Compute the patch transforming `left` into `right`
pub fn diff(left: &JsonValue, right: &JsonValue) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff_at(&mut String::new(), left, right, &mut ops);
    ops
}

fn diff_at(path: &mut String, left: &JsonValue, right: &JsonValue, ops: &mut Vec<PatchOp>) {
    match (left, right) {
        (JsonValue::Object(l), JsonValue::Object(r)) => {
            for (key, lv) in l {
                let len = push_segment(path, key);
                match r.get(key) {
                    Some(rv) => diff_at(path, lv, rv, ops),
                    None => ops.push(PatchOp::Remove { path: path.clone() }),
                }
                path.truncate(len);
            }
            for (key, rv) in r {
                if !l.contains_key(key) {
                    let len = push_segment(path, key);
                    ops.push(PatchOp::Add {
                        path: path.clone(),
                        value: rv.clone(),
                    });
                    path.truncate(len);
                }
            }
        }
        (JsonValue::Array(l), JsonValue::Array(r)) => {
            let common = l.len().min(r.len());
            for (i, (lv, rv)) in l.iter().zip(r.iter()).enumerate() {
                let len = push_segment(path, &i.to_string());
                diff_at(path, lv, rv, ops);
                path.truncate(len);
            }
            for (i, rv) in r.iter().enumerate().skip(common) {
                let len = push_segment(path, &i.to_string());
                ops.push(PatchOp::Add {
                    path: path.clone(),
                    value: rv.clone(),
                });
                path.truncate(len);
            }
            for i in (common..l.len()).rev() {
                let len = push_segment(path, &i.to_string());
                ops.push(PatchOp::Remove { path: path.clone() });
                path.truncate(len);
            }
        }
        _ => {
            if left != right {
                ops.push(PatchOp::Replace {
                    path: path.clone(),
                    value: right.clone(),
                });
            }
        }
    }
}

/// Append an escaped pointer segment, returning the length to truncate back to
fn push_segment(path: &mut String, segment: &str) -> usize {
    let len = path.len();
    path.push('/');
    for c in segment.chars() {
        match c {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            c => path.push(c),
        }
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_documents_produce_no_ops() {
        let doc = json!({"a": [1, {"b": null}], "c": "x"});
        assert!(diff(&doc, &doc).is_empty());
    }

    #[test]
    fn test_object_add_remove_replace() {
        let ops = diff(
            &json!({"keep": 1, "gone": true, "changed": "a"}),
            &json!({"keep": 1, "changed": "b", "new": [1]}),
        );
        assert_eq!(
            ops,
            vec![
                PatchOp::Replace {
                    path: "/changed".into(),
                    value: json!("b")
                },
                PatchOp::Remove {
                    path: "/gone".into()
                },
                PatchOp::Add {
                    path: "/new".into(),
                    value: json!([1])
                },
            ]
        );
    }

    #[test]
    fn test_array_shrink_removes_from_the_end() {
        let ops = diff(&json!([1, 2, 3, 4]), &json!([1, 5]));
        let paths: Vec<&str> = ops.iter().map(PatchOp::path).collect();
        assert_eq!(paths, vec!["/1", "/3", "/2"]);
        assert!(matches!(ops[1], PatchOp::Remove { .. }));
    }

    #[test]
    fn test_array_growth_appends() {
        let ops = diff(&json!({"items": []}), &json!({"items": ["a", "b"]}));
        assert_eq!(
            ops,
            vec![
                PatchOp::Add {
                    path: "/items/0".into(),
                    value: json!("a")
                },
                PatchOp::Add {
                    path: "/items/1".into(),
                    value: json!("b")
                },
            ]
        );
    }

    #[test]
    fn test_type_change_replaces_whole_node() {
        let ops = diff(&json!({"a": {"b": 1}}), &json!({"a": [1]}));
        assert_eq!(
            ops,
            vec![PatchOp::Replace {
                path: "/a".into(),
                value: json!([1])
            }]
        );

        let ops = diff(&json!([1]), &json!({"x": 1}));
        assert_eq!(ops[0].path(), "");
    }

    #[test]
    fn test_pointer_escaping() {
        let ops = diff(&json!({}), &json!({"a/b": 1, "m~n": 2}));
        let paths: Vec<&str> = ops.iter().map(PatchOp::path).collect();
        assert_eq!(paths, vec!["/a~1b", "/m~0n"]);
    }

    #[test]
    fn test_serialized_shape() {
        let op = PatchOp::Remove {
            path: "/a".into(),
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "remove", "path": "/a"})
        );
    }
}
