use std::collections::BTreeMap;

use connector_core::kv::KvRow;

use crate::model::{BodyType, FormValues};
use crate::query;

/// Field-level errors keyed by field path (e.g. `headers.0.key`).
pub type FieldErrors = BTreeMap<String, String>;

pub const URL_REQUIRED: &str = "Please specify a URL.";
pub const URL_INVALID: &str = "Please specify a valid URL.";
pub const KEY_REQUIRED: &str = "Please provide a key name.";
pub const RESPONSE_KEY_REQUIRED: &str = "Please provide a response key.";

/// Whether `url` is usable as the request URL. Data-element tokens may stand
/// for any part of it, so a URL starting with a token is accepted as is;
/// otherwise tokens are substituted and the result must be absolute http(s).
pub fn is_valid_url(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.starts_with("{{") && query::contains_token(trimmed) {
        return true;
    }
    let substituted = query::replace_tokens(trimmed, "token");
    match url::Url::parse(&substituted) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some(),
        Err(_) => false,
    }
}

fn validate_rows(prefix: &str, rows: &[KvRow], errors: &mut FieldErrors) {
    for (index, row) in rows.iter().enumerate() {
        if row.key.is_empty() && !row.value.is_empty() {
            errors.insert(format!("{prefix}.{index}.key"), KEY_REQUIRED.to_string());
        }
    }
}

/// Validate all fields. An empty map means the form is valid.
pub fn validate(values: &FormValues) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if values.url.trim().is_empty() {
        errors.insert("url".to_string(), URL_REQUIRED.to_string());
    } else if !is_valid_url(&values.url) {
        errors.insert("url".to_string(), URL_INVALID.to_string());
    }

    validate_rows("queryParams", &values.query_params, &mut errors);
    validate_rows("headers", &values.headers, &mut errors);
    if values.body_type == BodyType::Object {
        validate_rows("bodyJsonPairs", &values.body_json_pairs, &mut errors);
    }

    if values.save_response && values.response_key.trim().is_empty() {
        errors.insert(
            "responseKey".to_string(),
            RESPONSE_KEY_REQUIRED.to_string(),
        );
    }

    errors
}
