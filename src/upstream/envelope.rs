//! Response envelopes
//!
//! Endpoints answer either with the payload itself or with the payload
//! wrapped in an object. These helpers find the payload in both shapes.

use serde_json::Value;

use crate::model::RecordId;

const LIST_KEYS: [&str; 4] = ["data", "items", "results", "records"];
const RECORD_KEYS: [&str; 2] = ["data", "record"];

/// Items of a list response; anything that is not a list is empty
pub fn list_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// The record inside a single-record response
pub fn record_body(body: &Value) -> &Value {
    RECORD_KEYS
        .iter()
        .find_map(|key| body.get(*key).filter(|v| v.is_object()))
        .unwrap_or(body)
}

/// Id the server assigned in a create response, wrapped or not
pub fn created_id(body: &Value) -> Option<RecordId> {
    let id = record_body(body).get("id").or_else(|| body.get("id"))?;
    match id {
        Value::String(s) if !s.is_empty() => Some(RecordId::new(s.clone())),
        Value::Number(n) => Some(RecordId::new(n.to_string())),
        _ => None,
    }
}
