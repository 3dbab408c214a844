//! Body representation codec: raw text ⇄ JSON key/value rows.
//!
//! Switching from raw to rows is lossy: text that is not a flat JSON object
//! leaves the row editor with a single empty row. The raw text itself is
//! untouched until the user switches back to raw, at which point the rows
//! are what gets serialized.

use connector_core::kv::{self, KvRow};
use serde_json::{Map, Value};

use crate::model::{BodyType, RequestBody};

/// The body-related form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyFields {
    pub body_type: BodyType,
    pub body_raw: String,
    pub body_json_pairs: Vec<KvRow>,
}

/// Flatten the top-level entries of a JSON object into rows.
/// `None` when any value is nested or the object is empty.
fn flatten(map: &Map<String, Value>) -> Option<Vec<KvRow>> {
    if map.is_empty() {
        return None;
    }
    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Object(_) | Value::Array(_) => return None,
                scalar => scalar.to_string(),
            };
            Some(KvRow::new(key.as_str(), value))
        })
        .collect()
}

/// Rows for the JSON editor from raw text (raw → object transition).
pub fn raw_to_pairs(raw: &str) -> Vec<KvRow> {
    let rows = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => flatten(&map).unwrap_or_default(),
        _ => Vec::new(),
    };
    kv::with_placeholder(rows)
}

/// Build a JSON object from rows in row order. Rows with both key and value
/// empty are skipped; a later duplicate key overwrites the earlier value.
pub fn pairs_to_map(pairs: &[KvRow]) -> Map<String, Value> {
    pairs
        .iter()
        .filter(|p| !p.is_blank())
        .map(|p| (p.key.clone(), Value::String(p.value.clone())))
        .collect()
}

/// Raw text from the JSON editor rows (object → raw transition).
/// No rows left means an empty string, not `{}`.
pub fn pairs_to_raw(pairs: &[KvRow]) -> String {
    let map = pairs_to_map(pairs);
    if map.is_empty() {
        return String::new();
    }
    Value::Object(map).to_string()
}

/// The body to persist for the current editor state, ignoring the method.
pub fn to_settings(fields: &BodyFields) -> Option<RequestBody> {
    match fields.body_type {
        BodyType::Object => {
            let map = pairs_to_map(&fields.body_json_pairs);
            if map.is_empty() {
                None
            } else {
                Some(RequestBody::Object(map))
            }
        }
        BodyType::Raw => {
            if fields.body_raw.is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(&fields.body_raw) {
                Ok(value) => RequestBody::from_value(value),
                // Not JSON: keep the text.
                Err(_) => Some(RequestBody::Raw(fields.body_raw.clone())),
            }
        }
    }
}

/// Body form fields from a persisted body.
pub fn from_settings(body: Option<&RequestBody>) -> BodyFields {
    match body {
        Some(RequestBody::Object(map)) => match flatten(map) {
            Some(rows) => BodyFields {
                body_type: BodyType::Object,
                body_raw: Value::Object(map.clone()).to_string(),
                body_json_pairs: rows,
            },
            // Nested structures cannot be edited as rows.
            None => BodyFields {
                body_type: if map.is_empty() { BodyType::Object } else { BodyType::Raw },
                body_raw: if map.is_empty() {
                    String::new()
                } else {
                    Value::Object(map.clone()).to_string()
                },
                body_json_pairs: vec![KvRow::new_empty()],
            },
        },
        Some(RequestBody::Json(value)) => BodyFields {
            body_type: BodyType::Raw,
            body_raw: value.to_string(),
            body_json_pairs: vec![KvRow::new_empty()],
        },
        Some(RequestBody::Raw(text)) => BodyFields {
            body_type: BodyType::Raw,
            body_raw: text.clone(),
            body_json_pairs: raw_to_pairs(text),
        },
        None => BodyFields {
            body_type: BodyType::Object,
            body_raw: String::new(),
            body_json_pairs: vec![KvRow::new_empty()],
        },
    }
}
