//! Input sanitization
//!
//! Strips script-tag blocks and `javascript:` URI payloads from string
//! fields and trims surrounding whitespace, recursing into nested objects
//! and arrays. Matching is ASCII case-insensitive; byte offsets from the
//! lowercased shadow are valid on the original because ASCII lowercasing
//! preserves lengths.

use serde_json::Value;

/// Sanitize a JSON value, returning the cleaned copy and whether anything
/// changed
pub fn sanitize_value(value: &Value) -> (Value, bool) {
    match value {
        Value::String(s) => {
            let clean = sanitize_string(s);
            let changed = clean != *s;
            (Value::String(clean), changed)
        }
        Value::Array(items) => {
            let mut changed = false;
            let clean: Vec<Value> = items
                .iter()
                .map(|item| {
                    let (v, c) = sanitize_value(item);
                    changed |= c;
                    v
                })
                .collect();
            (Value::Array(clean), changed)
        }
        Value::Object(map) => {
            let mut changed = false;
            let clean: serde_json::Map<String, Value> = map
                .iter()
                .map(|(k, v)| {
                    let (v, c) = sanitize_value(v);
                    changed |= c;
                    (k.clone(), v)
                })
                .collect();
            (Value::Object(clean), changed)
        }
        other => (other.clone(), false),
    }
}

/// Sanitize a single string field
pub fn sanitize_string(s: &str) -> String {
    let stripped = strip_script_blocks(s);
    let stripped = remove_case_insensitive(&stripped, "javascript:");
    stripped.trim().to_string()
}

/// Remove `<script …>…</script>` blocks; an unterminated opening tag drops
/// the rest of the string
fn strip_script_blocks(s: &str) -> String {
    const OPEN: &str = "<script";
    const CLOSE: &str = "</script>";

    let lower = s.to_ascii_lowercase();
    let mut out = String::with_capacity(s.len());
    let mut idx = 0;

    while let Some(rel) = lower[idx..].find(OPEN) {
        let start = idx + rel;
        out.push_str(&s[idx..start]);
        match lower[start..].find(CLOSE) {
            Some(end_rel) => idx = start + end_rel + CLOSE.len(),
            None => {
                idx = s.len();
                break;
            }
        }
    }
    out.push_str(&s[idx..]);
    out
}

/// Remove every case-insensitive occurrence of `needle`
fn remove_case_insensitive(s: &str, needle: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(s.len());
    let mut idx = 0;

    while let Some(rel) = lower[idx..].find(&needle) {
        let start = idx + rel;
        out.push_str(&s[idx..start]);
        idx = start + needle.len();
    }
    out.push_str(&s[idx..]);
    out
}
