use connector_core::kv::KvRow;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// HTTP methods offered by the method picker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }

    /// Whether requests with this method carry a body. Only GET does not.
    pub fn has_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

/// The request body as persisted in settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// A JSON object, sent JSON-encoded.
    Object(Map<String, Value>),
    /// Raw text, sent as is.
    Raw(String),
    /// Any other JSON value parsed from the raw editor, sent JSON-encoded.
    Json(Value),
}

impl RequestBody {
    /// Body for a parsed JSON value. Falsy values (`null`, `false`, `0`,
    /// `""`) mean no body.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null | Value::Bool(false) => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(RequestBody::Raw(text)),
            Value::Object(map) => Some(RequestBody::Object(map)),
            other => Some(RequestBody::Json(other)),
        }
    }

    /// The wire form of the body.
    pub fn to_wire(&self) -> String {
        match self {
            RequestBody::Object(map) => Value::Object(map.clone()).to_string(),
            RequestBody::Raw(text) => text.clone(),
            RequestBody::Json(value) => value.to_string(),
        }
    }
}

/// Persisted configuration of the send-data action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSettings {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<KvRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_key: Option<String>,
}

/// Which editor the body tab shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// Key/value rows collapsed into a JSON object.
    #[default]
    Object,
    Raw,
}

/// The editable state of the request panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    pub method: HttpMethod,
    pub url: String,
    pub query_params: Vec<KvRow>,
    pub headers: Vec<KvRow>,
    pub body_type: BodyType,
    pub body_raw: String,
    pub body_json_pairs: Vec<KvRow>,
    pub save_response: bool,
    pub response_key: String,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            url: String::new(),
            query_params: vec![KvRow::new_empty()],
            headers: vec![KvRow::new_empty()],
            body_type: BodyType::Object,
            body_raw: String::new(),
            body_json_pairs: vec![KvRow::new_empty()],
            save_response: false,
            response_key: String::new(),
        }
    }
}

/// What the host passes to the panel on initialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitInfo {
    pub settings: Option<RequestSettings>,
    pub company_id: Option<String>,
    pub ims_org_id: Option<String>,
    pub access_token: Option<String>,
    pub property_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_roundtrip() {
        for method in HttpMethod::ALL {
            assert_eq!(HttpMethod::from_str(method.as_str()), Some(method));
        }
        assert_eq!(HttpMethod::from_str("post"), Some(HttpMethod::Post));
        assert_eq!(HttpMethod::from_str("TRACE"), None);
    }

    #[test]
    fn test_only_get_is_bodiless() {
        assert!(!HttpMethod::Get.has_body());
        assert!(HttpMethod::Post.has_body());
        assert!(HttpMethod::Delete.has_body());
    }

    #[test]
    fn test_settings_omit_empty_fields() {
        let settings = RequestSettings {
            method: HttpMethod::Post,
            url: "http://x.com".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value, json!({ "method": "POST", "url": "http://x.com" }));
    }

    #[test]
    fn test_settings_body_shapes() {
        let settings: RequestSettings = serde_json::from_value(json!({
            "method": "PUT",
            "url": "http://x.com",
            "headers": [{ "key": "a", "value": "b" }],
            "body": { "e": "f" },
            "responseKey": "keyName"
        }))
        .unwrap();
        assert_eq!(settings.method, HttpMethod::Put);
        assert_eq!(settings.headers, Some(vec![KvRow::new("a", "b")]));
        assert!(matches!(settings.body, Some(RequestBody::Object(_))));
        assert_eq!(settings.response_key.as_deref(), Some("keyName"));

        let raw: RequestSettings =
            serde_json::from_value(json!({ "body": "{\"e\":\"f\"}" })).unwrap();
        assert_eq!(raw.method, HttpMethod::Get);
        assert_eq!(raw.body, Some(RequestBody::Raw("{\"e\":\"f\"}".to_string())));
    }

    #[test]
    fn test_settings_load_any_json_body() {
        let array: RequestSettings = serde_json::from_value(
            json!({ "method": "POST", "url": "http://x.com", "body": [1, 2] }),
        )
        .unwrap();
        assert_eq!(array.body, Some(RequestBody::Json(json!([1, 2]))));

        let number: RequestSettings =
            serde_json::from_value(json!({ "method": "POST", "body": 123 })).unwrap();
        assert_eq!(number.body, Some(RequestBody::Json(json!(123))));
        assert_eq!(
            serde_json::to_value(&number).unwrap(),
            json!({ "method": "POST", "url": "", "body": 123 })
        );

        let null: RequestSettings = serde_json::from_value(json!({ "body": null })).unwrap();
        assert_eq!(null.body, None);
    }

    #[test]
    fn test_body_from_value_drops_falsy() {
        assert_eq!(RequestBody::from_value(json!(null)), None);
        assert_eq!(RequestBody::from_value(json!(false)), None);
        assert_eq!(RequestBody::from_value(json!(0)), None);
        assert_eq!(RequestBody::from_value(json!(0.0)), None);
        assert_eq!(RequestBody::from_value(json!("")), None);
        assert_eq!(
            RequestBody::from_value(json!(true)),
            Some(RequestBody::Json(json!(true)))
        );
        assert_eq!(
            RequestBody::from_value(json!("text")),
            Some(RequestBody::Raw("text".to_string()))
        );
        assert!(matches!(
            RequestBody::from_value(json!({})),
            Some(RequestBody::Object(_))
        ));
    }

    #[test]
    fn test_body_wire_form() {
        let mut map = Map::new();
        map.insert("a".to_string(), json!("b"));
        assert_eq!(RequestBody::Object(map).to_wire(), r#"{"a":"b"}"#);
        assert_eq!(RequestBody::Raw("raw".to_string()).to_wire(), "raw");
        assert_eq!(RequestBody::Json(json!([1, 2])).to_wire(), "[1,2]");
    }
}
