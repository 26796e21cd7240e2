//! Normalizer: unwraps the backend's inconsistent response envelopes.
//!
//! Each resource may come back bare or as `{ success, data }`. Institutes may
//! additionally nest their list under `institutes`. One pure function per
//! resource kind, each with a fixed fallback order.

use serde_json::Value;
use tracing::warn;

use crate::errors::PageError;
use crate::form::model::Fields;

/// The three loaded resources in plain form.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub districts: Vec<Value>,
    pub institutes: Vec<Value>,
    pub cv: Fields,
}

/// Normalizes all three bodies. Fails with `NotFound` when the CV record is empty.
pub fn normalize(districts: Value, institutes: Value, cv: Value) -> Result<Normalized, PageError> {
    let cv = normalize_cv(cv)?;
    Ok(Normalized {
        districts: normalize_districts(districts),
        institutes: normalize_institutes(institutes),
        cv,
    })
}

pub fn normalize_districts(body: Value) -> Vec<Value> {
    into_list("districts", unwrap_envelope(body))
}

/// `data.institutes`, then `data`, for enveloped bodies; `body.institutes`, then `body`, otherwise.
pub fn normalize_institutes(body: Value) -> Vec<Value> {
    let payload = match unwrap_envelope(body) {
        Value::Object(mut map) if map.get("institutes").is_some_and(is_truthy) => map
            .remove("institutes")
            .unwrap_or(Value::Null),
        other => other,
    };
    into_list("institutes", payload)
}

pub fn normalize_cv(body: Value) -> Result<Fields, PageError> {
    match unwrap_envelope(body) {
        Value::Object(map) if !map.is_empty() => Ok(map),
        _ => Err(PageError::NotFound(None)),
    }
}

/// Display text for a district or institute entry: the string itself, or its `name`.
pub fn reference_label(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Returns `data` when `success` is present and truthy, otherwise the body unchanged.
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("success").is_some_and(is_truthy) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn into_list(kind: &str, payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items,
        other => {
            if is_truthy(&other) {
                warn!("Expected a list of {kind}, got {other}; using an empty list");
            }
            Vec::new()
        }
    }
}

/// JSON truthiness: null, false, 0 and "" are falsy; arrays and objects are always truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
