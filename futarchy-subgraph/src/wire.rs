//! Serde helpers for indexer wire formats
//!
//! graph-node returns `BigInt`/`BigDecimal` as JSON strings while the
//! checkpoint indexer returns plain numbers. Both decode to the same text.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string or a number, yielding its text form.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Optional variant of [`string_or_number`]; `null` and absence map to `None`.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Integer from a string or a number.
pub fn i64_from_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let text = string_or_number(deserializer)?;
    text.trim()
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid integer '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(deserialize_with = "i64_from_string_or_number")]
        ts: i64,
        #[serde(deserialize_with = "string_or_number")]
        close: String,
        #[serde(default, deserialize_with = "opt_string_or_number")]
        price: Option<String>,
    }

    #[test]
    fn test_string_and_number_forms() {
        let a: Row = serde_json::from_value(json!({ "ts": "3600", "close": "1.5" })).unwrap();
        let b: Row = serde_json::from_value(json!({ "ts": 3600, "close": 1.5 })).unwrap();
        assert_eq!(a.ts, b.ts);
        assert_eq!(a.close, b.close);
        assert!(a.price.is_none());
    }
}
