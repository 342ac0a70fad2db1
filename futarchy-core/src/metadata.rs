//! Optional typed metadata values
//!
//! Proposal metadata is free-form JSON written by humans. Numbers arrive as
//! JSON numbers or as strings, sometimes with stray whitespace. Every lookup
//! goes through these helpers so a malformed field becomes `None` instead of
//! failing the whole resolution.

use serde_json::Value;

/// First value found under any of `keys`. Dotted keys walk nested objects.
pub fn lookup<'a>(blob: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        key.split('.')
            .try_fold(blob, |node, part| node.get(part))
            .filter(|v| !v.is_null())
    })
}

/// Non-empty trimmed string value.
pub fn parse_optional_string(blob: &Value, keys: &[&str]) -> Option<String> {
    match lookup(blob, keys)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Signed integer from a JSON number or a numeric string.
pub fn parse_optional_i64(blob: &Value, keys: &[&str]) -> Option<i64> {
    match lookup(blob, keys)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Unsigned integer from a JSON number or a numeric string.
pub fn parse_optional_u64(blob: &Value, keys: &[&str]) -> Option<u64> {
    parse_optional_i64(blob, keys).and_then(|v| u64::try_from(v).ok())
}

/// Small unsigned integer (precision, decimals).
pub fn parse_optional_u32(blob: &Value, keys: &[&str]) -> Option<u32> {
    parse_optional_u64(blob, keys).and_then(|v| u32::try_from(v).ok())
}

/// Parse a JSON document that may itself be malformed.
pub fn parse_blob(raw: Option<&str>) -> Value {
    raw.and_then(|s| serde_json::from_str::<Value>(s).ok())
        .filter(Value::is_object)
        .unwrap_or(Value::Null)
}
