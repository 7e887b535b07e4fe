//! Lenient field deserializers.
//!
//! Use with `#[serde(default, deserialize_with = "...")]`. Unparsable values
//! become `None` instead of failing the whole record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Number, numeric string, or null
pub fn opt_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| value_to_f64(&v)))
}

/// Non-negative integer count from the same inputs as [`opt_number`]
pub fn opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(opt_number(deserializer)?
        .filter(|n| *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32))
}

/// String, or a number rendered as a string
pub fn opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Like [`opt_string`] for required text fields; null and garbage become ""
pub fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

/// A list that may be null; entries that fail to decode are dropped
pub fn list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Bool, "true"/"false"/"yes"/"no", or 0/1
pub fn opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "opt_number")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "opt_count")]
        count: Option<u32>,
        #[serde(default, deserialize_with = "opt_string")]
        label: Option<String>,
        #[serde(default, deserialize_with = "opt_bool")]
        flag: Option<bool>,
        #[serde(default, deserialize_with = "string_or_empty")]
        name: String,
        #[serde(default, deserialize_with = "list_or_empty")]
        values: Vec<u32>,
    }

    fn parse(json: &str) -> Fields {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn numbers_from_strings() {
        let p = parse(r#"{"value": "12.5", "count": "3"}"#);
        assert_eq!(p.value, Some(12.5));
        assert_eq!(p.count, Some(3));
    }

    #[test]
    fn garbage_becomes_none() {
        let p = parse(r#"{"value": "n/a", "count": -4, "label": "", "flag": "maybe"}"#);
        assert_eq!(p.value, None);
        assert_eq!(p.count, None);
        assert_eq!(p.label, None);
        assert_eq!(p.flag, None);
    }

    #[test]
    fn missing_fields_default() {
        let p = parse("{}");
        assert!(p.value.is_none() && p.count.is_none() && p.label.is_none() && p.flag.is_none());
    }

    #[test]
    fn strings_from_numbers_and_flags_from_ints() {
        let p = parse(r#"{"label": 4711, "flag": 1}"#);
        assert_eq!(p.label.as_deref(), Some("4711"));
        assert_eq!(p.flag, Some(true));
    }

    #[test]
    fn null_text_and_lists_become_empty() {
        let p = parse(r#"{"name": null, "values": null}"#);
        assert_eq!(p.name, "");
        assert!(p.values.is_empty());

        let p = parse(r#"{"name": {"first": "A"}, "values": [1, "x", 3]}"#);
        assert_eq!(p.name, "");
        assert_eq!(p.values, vec![1, 3]);

        assert_eq!(parse(r#"{"name": 42}"#).name, "42");
    }
}
