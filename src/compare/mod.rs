//! Response comparison
//!
//! Classifies a pair of responses as JSON or text and produces a unified
//! diff, a structural patch and a one-line summary. Everything here is a
//! pure function of its inputs and safe to call from any thread.

pub mod patch;
pub mod summary;

use serde::Serialize;
use serde_json::Value as JsonValue;
use similar::TextDiff;

pub use patch::PatchOp;

/// Lines of context around each hunk
const CONTEXT_LINES: usize = 3;

/// Comparison granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Compare full values
    #[default]
    Full,
    /// Compare only keys and value types
    KeysOnly,
}

impl CompareMode {
    pub fn from_keys_only(keys_only: bool) -> Self {
        if keys_only {
            Self::KeysOnly
        } else {
            Self::Full
        }
    }
}

/// Outcome of comparing two responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult {
    /// Unified diff, empty when the compared text is identical
    pub text_diff: String,
    /// Operations turning the left document into the right one
    pub patch: Vec<PatchOp>,
    pub summary: String,
}

impl DiffResult {
    /// True when neither the text nor the structure differs
    pub fn is_identical(&self) -> bool {
        self.text_diff.is_empty() && self.patch.is_empty()
    }
}

/// Compare two raw responses
///
/// Input that is not valid JSON falls back to a line diff of the raw text;
/// this never fails.
pub fn compare(
    left: &[u8],
    right: &[u8],
    left_label: &str,
    right_label: &str,
    mode: CompareMode,
) -> DiffResult {
    match (
        serde_json::from_slice::<JsonValue>(left),
        serde_json::from_slice::<JsonValue>(right),
    ) {
        (Ok(l), Ok(r)) => compare_json(l, r, left_label, right_label, mode),
        (l, r) => compare_text(left, right, left_label, right_label, l.is_ok(), r.is_ok()),
    }
}

fn compare_text(
    left: &[u8],
    right: &[u8],
    left_label: &str,
    right_label: &str,
    left_is_json: bool,
    right_is_json: bool,
) -> DiffResult {
    let mut summary = match (left_is_json, right_is_json) {
        (false, false) => "Both responses are non-JSON content".to_string(),
        (false, true) => format!("Response from {left_label} is not valid JSON"),
        _ => format!("Response from {right_label} is not valid JSON"),
    };

    let text_diff = if left == right {
        summary.push_str(" (content is identical)");
        String::new()
    } else {
        unified_diff(
            &String::from_utf8_lossy(left),
            &String::from_utf8_lossy(right),
            left_label,
            right_label,
        )
    };

    DiffResult {
        text_diff,
        patch: Vec::new(),
        summary,
    }
}

fn compare_json(
    left: JsonValue,
    right: JsonValue,
    left_label: &str,
    right_label: &str,
    mode: CompareMode,
) -> DiffResult {
    let (left, right) = match mode {
        CompareMode::Full => (left, right),
        CompareMode::KeysOnly => (summary::skeleton(&left), summary::skeleton(&right)),
    };

    let text_diff = unified_diff(&pretty(&left), &pretty(&right), left_label, right_label);
    let patch = patch::diff(&left, &right);
    let summary = match mode {
        CompareMode::Full => summary::summarize_values(&left, &right),
        CompareMode::KeysOnly => summary::summarize_keys(&left, &right),
    };

    DiffResult {
        text_diff,
        patch,
        summary,
    }
}

fn pretty(value: &JsonValue) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    text.push('\n');
    text
}

fn unified_diff(left: &str, right: &str, left_label: &str, right_label: &str) -> String {
    TextDiff::from_lines(left, right)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(left_label, right_label)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_self_compare_json_is_unchanged() {
        let body = br#"{"users":[{"id":1}],"total":1}"#;
        let result = compare(body, body, "v1", "v2", CompareMode::Full);
        assert_eq!(result.summary, "No top-level changes");
        assert!(result.is_identical());
    }

    #[test]
    fn test_self_compare_text_is_identical() {
        let body = b"<html>oops</html>\n";
        let result = compare(body, body, "v1", "v2", CompareMode::Full);
        assert!(result.summary.ends_with("(content is identical)"));
        assert_eq!(result.summary, "Both responses are non-JSON content (content is identical)");
        assert!(result.text_diff.is_empty());
        assert!(result.patch.is_empty());
    }

    #[test]
    fn test_one_side_invalid_json_names_that_side() {
        let result = compare(b"{\"a\":1}", b"Bad Gateway", "v1", "v2", CompareMode::Full);
        assert_eq!(result.summary, "Response from v2 is not valid JSON");
        assert!(result.text_diff.contains("-{\"a\":1}"));
        assert!(result.text_diff.contains("+Bad Gateway"));

        let result = compare(b"Bad Gateway", b"{}", "v1", "v2", CompareMode::KeysOnly);
        assert_eq!(result.summary, "Response from v1 is not valid JSON");
    }

    #[test]
    fn test_keys_only_ignores_values() {
        let result = compare(
            br#"{"a":1,"b":2}"#,
            br#"{"a":99,"b":2}"#,
            "v1",
            "v2",
            CompareMode::KeysOnly,
        );
        assert_eq!(result.summary, "No structural changes (keys match)");
        assert!(result.is_identical());
    }

    #[test]
    fn test_keys_only_reports_type_change_in_patch() {
        let result = compare(
            br#"{"a":1}"#,
            br#"{"a":"1"}"#,
            "v1",
            "v2",
            CompareMode::KeysOnly,
        );
        assert_eq!(result.summary, "No structural changes (keys match)");
        assert_eq!(result.patch.len(), 1);
        assert!(result.text_diff.contains("+  \"a\": \"<string>\""));
    }

    #[test]
    fn test_full_compare_field_added() {
        let result = compare(br#"{"a":1}"#, br#"{"a":1,"b":2}"#, "v1", "v2", CompareMode::Full);
        assert_eq!(result.summary, "Field 'b' added");
        assert_eq!(
            result.patch,
            vec![PatchOp::Add {
                path: "/b".into(),
                value: serde_json::json!(2)
            }]
        );
    }

    #[test]
    fn test_full_compare_array_items_changed() {
        let result = compare(b"[1,2,3]", b"[1,9,3]", "v1", "v2", CompareMode::Full);
        assert_eq!(result.summary, "Array: 1 of 3 items changed");
    }

    #[test]
    fn test_unified_diff_format() {
        let result = compare(br#"{"a":1}"#, br#"{"a":2}"#, "v1", "v2", CompareMode::Full);
        assert_eq!(
            result.text_diff,
            "--- v1\n+++ v2\n@@ -1,3 +1,3 @@\n {\n-  \"a\": 1\n+  \"a\": 2\n }\n"
        );
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let left = br#"{"b":1,"a":2}"#.to_vec();
        let right = b"not json".to_vec();
        let (l, r) = (left.clone(), right.clone());
        let _ = compare(&left, &right, "v1", "v2", CompareMode::KeysOnly);
        assert_eq!(left, l);
        assert_eq!(right, r);
    }
}
