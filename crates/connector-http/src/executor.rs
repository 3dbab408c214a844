use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::headers;
use crate::model::RequestSettings;
use crate::transport::{OutboundRequest, Transport};

/// Key of this connector's entry in the rule stash.
pub const STASH_NAMESPACE: &str = "adobe-cloud-connector";

/// This connector's slice of the rule stash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorStash {
    #[serde(default)]
    pub responses: BTreeMap<String, String>,
}

/// Per-rule-execution accumulator shared by the actions of a rule, keyed
/// by extension namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleStash(Map<String, Value>);

impl RuleStash {
    pub fn new() -> Self {
        Self::default()
    }

    /// This connector's entry, or an empty one when absent or malformed.
    pub fn connector(&self) -> ConnectorStash {
        match self.0.get(STASH_NAMESPACE) {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed {STASH_NAMESPACE} rule stash entry: {e}");
                ConnectorStash::default()
            }),
            None => ConnectorStash::default(),
        }
    }

    pub fn set_connector(&mut self, stash: &ConnectorStash) {
        let value = serde_json::to_value(stash).unwrap_or_default();
        self.0.insert(STASH_NAMESPACE.to_string(), value);
    }

    pub fn get(&self, namespace: &str) -> Option<&Value> {
        self.0.get(namespace)
    }
}

/// Turn persisted settings into the request sent over the wire: header
/// rows collapse into a mapping, a JSON object body is serialized.
pub fn build_request(settings: &RequestSettings) -> OutboundRequest {
    OutboundRequest {
        method: settings.method,
        url: settings.url.clone(),
        headers: settings
            .headers
            .as_deref()
            .map(headers::collapse)
            .unwrap_or_default(),
        body: settings.body.as_ref().map(|b| b.to_wire()),
    }
}

/// Perform the configured request once.
///
/// When a response key is configured the response body is read and stored
/// under `responses[responseKey]` of this connector's stash entry. The
/// response status is not inspected. Transport errors are returned as is.
pub async fn dispatch(
    settings: &RequestSettings,
    rule_stash: &RuleStash,
    transport: &dyn Transport,
) -> Result<ConnectorStash> {
    let request = build_request(settings);
    log::debug!(
        "Dispatching {} {} ({} headers, body: {})",
        request.method.as_str(),
        request.url,
        request.headers.len(),
        request.body.is_some()
    );

    let mut response = transport.fetch(request).await?;
    let mut stash = rule_stash.connector();

    if let Some(key) = settings.response_key.as_deref().filter(|k| !k.is_empty()) {
        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        log::debug!("Saving {} byte response under {key:?}", bytes.len());
        stash.responses.insert(key.to_string(), body);
    }

    Ok(stash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HttpMethod, RequestBody};
    use crate::transport::fake::FakeTransport;
    use connector_core::kv::KvRow;
    use serde_json::json;

    fn settings() -> RequestSettings {
        RequestSettings {
            method: HttpMethod::Get,
            url: "http://www.someurl.com?a=1&b=2".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_dispatch_calls_url() {
        let transport = FakeTransport::new();
        let stash = dispatch(&settings(), &RuleStash::new(), &transport)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://www.someurl.com?a=1&b=2");
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert!(requests[0].headers.is_empty());
        assert_eq!(requests[0].body, None);
        assert_eq!(stash, ConnectorStash::default());
    }

    #[tokio::test]
    async fn test_dispatch_collapses_headers() {
        let transport = FakeTransport::new();
        let mut settings = settings();
        settings.headers = Some(vec![
            KvRow::new("a", "b"),
            KvRow::new("c", "d"),
            KvRow::new("a", "z"),
        ]);
        dispatch(&settings, &RuleStash::new(), &transport)
            .await
            .unwrap();

        let headers = &transport.requests()[0].headers;
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["a"], "z");
        assert_eq!(headers["c"], "d");
    }

    #[tokio::test]
    async fn test_dispatch_json_body() {
        let transport = FakeTransport::new();
        let mut settings = settings();
        let Value::Object(map) = json!({ "a": "b" }) else {
            unreachable!()
        };
        settings.body = Some(RequestBody::Object(map));
        dispatch(&settings, &RuleStash::new(), &transport)
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].body.as_deref(), Some(r#"{"a":"b"}"#));
    }

    #[tokio::test]
    async fn test_dispatch_raw_body() {
        let transport = FakeTransport::new();
        let mut settings = settings();
        settings.body = Some(RequestBody::Raw("raw".to_string()));
        dispatch(&settings, &RuleStash::new(), &transport)
            .await
            .unwrap();

        assert_eq!(transport.requests()[0].body.as_deref(), Some("raw"));
    }

    #[tokio::test]
    async fn test_dispatch_saves_response() {
        let transport = FakeTransport::new().respond(200, "OK", "result");
        let mut settings = settings();
        settings.response_key = Some("a".to_string());

        let stash = dispatch(&settings, &RuleStash::new(), &transport)
            .await
            .unwrap();
        assert_eq!(stash.responses.len(), 1);
        assert_eq!(stash.responses["a"], "result");
    }

    #[tokio::test]
    async fn test_dispatch_ignores_status() {
        let transport = FakeTransport::new().respond(500, "Internal Server Error", "oops");
        let mut settings = settings();
        settings.response_key = Some("err".to_string());

        let stash = dispatch(&settings, &RuleStash::new(), &transport)
            .await
            .unwrap();
        assert_eq!(stash.responses["err"], "oops");
    }

    #[tokio::test]
    async fn test_dispatch_keeps_previous_responses() {
        let transport = FakeTransport::new().respond(200, "OK", "second");
        let mut rule_stash = RuleStash::new();
        let mut previous = ConnectorStash::default();
        previous
            .responses
            .insert("first".to_string(), "one".to_string());
        rule_stash.set_connector(&previous);

        let mut settings = settings();
        settings.response_key = Some("second".to_string());
        let stash = dispatch(&settings, &rule_stash, &transport).await.unwrap();

        assert_eq!(stash.responses["first"], "one");
        assert_eq!(stash.responses["second"], "second");
    }

    #[tokio::test]
    async fn test_dispatch_propagates_transport_error() {
        let transport = FakeTransport::new().fail("connection refused");
        let err = dispatch(&settings(), &RuleStash::new(), &transport)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "HTTP error: connection refused");
    }

    #[test]
    fn test_rule_stash_namespace() {
        let rule_stash: RuleStash = serde_json::from_value(json!({
            "adobe-cloud-connector": { "responses": { "a": "result" } },
            "other-extension": { "x": 1 }
        }))
        .unwrap();

        assert_eq!(rule_stash.connector().responses["a"], "result");
        assert_eq!(rule_stash.get("other-extension"), Some(&json!({ "x": 1 })));

        let malformed: RuleStash =
            serde_json::from_value(json!({ "adobe-cloud-connector": 42 })).unwrap();
        assert_eq!(malformed.connector(), ConnectorStash::default());
    }

    #[test]
    fn test_rule_stash_serializes_responses() {
        let mut rule_stash = RuleStash::new();
        let mut stash = ConnectorStash::default();
        stash.responses.insert("a".to_string(), "result".to_string());
        rule_stash.set_connector(&stash);

        assert_eq!(
            serde_json::to_value(&rule_stash).unwrap(),
            json!({ "adobe-cloud-connector": { "responses": { "a": "result" } } })
        );
    }
}
