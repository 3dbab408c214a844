//! The fetch-like capability the dispatch action and the platform API
//! client send requests through.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::{ConnectorError, Result};
use crate::model::HttpMethod;

/// A request ready to go over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

/// A response whose body has not been read yet.
#[async_trait]
pub trait TransportResponse: Send {
    fn status(&self) -> u16;

    fn status_text(&self) -> String;

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Read the whole body. Can be called once.
    async fn bytes(&mut self) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a single request. No retry.
    async fn fetch(&self, request: OutboundRequest) -> Result<Box<dyn TransportResponse>>;
}

// ── reqwest ──────────────────────────────────────────────────────────

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

struct ReqwestResponse {
    status: reqwest::StatusCode,
    inner: Option<reqwest::Response>,
}

#[async_trait]
impl TransportResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.status.as_u16()
    }

    fn status_text(&self) -> String {
        self.status.canonical_reason().unwrap_or("").to_string()
    }

    async fn bytes(&mut self) -> Result<Vec<u8>> {
        let response = self
            .inner
            .take()
            .ok_or_else(|| ConnectorError::Body("body already consumed".to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ConnectorError::Body(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: OutboundRequest) -> Result<Box<dyn TransportResponse>> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        log::debug!(
            "{} {} -> {}",
            request.method.as_str(),
            request.url,
            response.status()
        );
        Ok(Box::new(ReqwestResponse {
            status: response.status(),
            inner: Some(response),
        }))
    }
}

// ── In-memory transport for tests ────────────────────────────────────
