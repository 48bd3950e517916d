//! Flattening of the platform's two rich-text conventions.
//!
//! Text in watch and browse payloads is either `{"simpleText": "..."}` or
//! `{"runs": [{"text": "..."}, ...]}`, and occasionally a bare string. Callers should not care
//! which one a given field happens to use today.

use serde_json::Value;

/// Collects the text of `node` into a single string.
///
/// Absent or unrecognized nodes yield an empty string; fragments without a `text` field are
/// skipped rather than failing the whole node.
pub fn collect_text(node: Option<&Value>) -> String {
    let Some(node) = node else {
        return String::new();
    };
    match node {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            if let Some(Value::String(simple)) = map.get("simpleText") {
                return simple.clone();
            }
            match map.get("runs") {
                Some(Value::Array(runs)) => runs
                    .iter()
                    .filter_map(|run| run.get("text").and_then(Value::as_str))
                    .collect(),
                _ => String::new(),
            }
        }
        _ => String::new(),
    }
}

/// Like [`collect_text`], but `None` when nothing was collected.
pub fn non_empty_text(node: Option<&Value>) -> Option<String> {
    let text = collect_text(node);
    (!text.is_empty()).then_some(text)
}
