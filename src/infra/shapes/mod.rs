//! Pure transforms from raw backend payloads to view-model fragments.
//!
//! The backend is not consistent about envelopes: the same dataset shows up
//! as a bare array, as an object, or wrapped in `{"data": ...}`. Each
//! builder decodes its known shapes in a fixed order and rejects anything
//! else with a [`ShapeError`]. Inside a recognised shape, bad fields degrade
//! (skipped rows, `None` numbers) rather than failing the payload.

pub mod coal;
pub mod exchange;
pub mod export_total;
pub mod metrics;
pub mod monthly;
pub mod value_pie;

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("{dataset}: unexpected payload shape ({found})")]
    Unrecognized {
        dataset: &'static str,
        found: &'static str,
    },
}

impl ShapeError {
    pub(crate) fn unrecognized(dataset: &'static str, value: &Value) -> Self {
        ShapeError::Unrecognized {
            dataset,
            found: json_kind(value),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `{"data": {...}}` envelope around an object payload, when the object
/// does not itself carry any of the dataset's own keys.
fn object_envelope<'a>(map: &'a Map<String, Value>, own_keys: &[&str]) -> Option<&'a Value> {
    if own_keys.iter().any(|key| map.contains_key(*key)) {
        return None;
    }
    map.get("data").filter(|inner| inner.is_object())
}

/// Objects out of a row list; anything else in the list is dropped.
fn object_rows(rows: Vec<Value>) -> Vec<Map<String, Value>> {
    rows.into_iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

/// Label text from a string or number field (`2025` and `"2025"` alike).
fn label_from(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
