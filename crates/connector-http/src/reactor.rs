//! Client for the tag-management platform API (Reactor) and the
//! certificate status table shown under the advanced section.

use chrono::{DateTime, Duration, Utc};
use connector_core::config::ConnectorConfig;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ConnectorError, Result};
use crate::model::InitInfo;
use crate::transport::{OutboundRequest, Transport};

pub const API_PRODUCTION_URL: &str = "https://reactor.adobe.io";
pub const API_STAGE_URL: &str = "https://reactor-stage.adobe.io";
pub const CLIENT_ID: &str = "Activation-DTM";
pub const CERTIFICATE_TYPE: &str = "certificates";
pub const UI_PRODUCTION_URL: &str = "https://experience.adobe.com/data-collection/eventForwarding";
pub const UI_STAGE_URL: &str =
    "https://experience-stage.adobe.com/data-collection/eventForwarding";

/// Certificates expiring within this many days are flagged.
const EXPIRY_WARNING_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReactorEnvironment {
    #[default]
    Production,
    Staging,
}

/// Request-scoped platform API settings, set up once per panel load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSettings {
    pub ims_org_id: String,
    pub token: String,
    /// Overrides the endpoint derived from `environment`.
    pub api_endpoint: Option<String>,
    pub environment: ReactorEnvironment,
    pub company_id: String,
    pub property_id: String,
}

impl FetchSettings {
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self {
            ims_org_id: config.ims_org_id.clone().unwrap_or_default(),
            token: config.access_token.clone().unwrap_or_default(),
            api_endpoint: config.api_endpoint.clone(),
            environment: if config.staging {
                ReactorEnvironment::Staging
            } else {
                ReactorEnvironment::Production
            },
            company_id: config.company_id.clone().unwrap_or_default(),
            property_id: config.property_id.clone().unwrap_or_default(),
        }
    }

    /// Settings from the host's init info. Endpoint and environment are
    /// taken from `base`.
    pub fn from_init_info(info: &InitInfo, base: &FetchSettings) -> Self {
        Self {
            ims_org_id: info.ims_org_id.clone().unwrap_or_default(),
            token: info.access_token.clone().unwrap_or_default(),
            api_endpoint: base.api_endpoint.clone(),
            environment: base.environment,
            company_id: info.company_id.clone().unwrap_or_default(),
            property_id: info.property_id.clone().unwrap_or_default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.ims_org_id.is_empty() && !self.token.is_empty()
    }

    pub fn api_base(&self) -> &str {
        match (&self.api_endpoint, self.environment) {
            (Some(endpoint), _) => endpoint.trim_end_matches('/'),
            (None, ReactorEnvironment::Staging) => API_STAGE_URL,
            (None, ReactorEnvironment::Production) => API_PRODUCTION_URL,
        }
    }

    pub fn ui_base(&self) -> &str {
        match self.environment {
            ReactorEnvironment::Staging => UI_STAGE_URL,
            ReactorEnvironment::Production => UI_PRODUCTION_URL,
        }
    }

    /// Link to an environment in the data collection UI.
    pub fn environment_url(&self, environment_id: &str) -> String {
        format!(
            "{}/companies/{}/properties/{}/environments/{}",
            self.ui_base(),
            self.company_id,
            self.property_id,
            environment_id
        )
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// Title of the first JSON:API error, if any.
fn first_error_title(json: &Value) -> Option<String> {
    json.get("errors")?
        .get(0)?
        .get("title")?
        .as_str()
        .map(str::to_string)
}

pub struct ReactorClient<'a> {
    settings: &'a FetchSettings,
    transport: &'a dyn Transport,
}

impl<'a> ReactorClient<'a> {
    pub fn new(settings: &'a FetchSettings, transport: &'a dyn Transport) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// GET `path` (relative to the API endpoint, or absolute) and parse the
    /// JSON body. Non-2xx answers become [`ConnectorError::Api`].
    pub async fn fetch_json(&self, path: &str) -> Result<Value> {
        if !self.settings.is_configured() {
            return Err(ConnectorError::MissingFetchSettings);
        }

        let url = if is_absolute(path) {
            path.to_string()
        } else {
            format!("{}{}", self.settings.api_base(), path)
        };

        let mut request = OutboundRequest::get(&url);
        request.headers.extend([
            (
                "Accept".to_string(),
                "application/vnd.api+json;revision=1".to_string(),
            ),
            (
                "Content-Type".to_string(),
                "application/vnd.api+json".to_string(),
            ),
            ("X-Api-Key".to_string(), CLIENT_ID.to_string()),
            (
                "x-gw-ims-org-id".to_string(),
                self.settings.ims_org_id.clone(),
            ),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.settings.token),
            ),
        ]);

        log::debug!("Fetching {url}");
        let mut response = self.transport.fetch(request).await?;
        let bytes = response.bytes().await?;
        let json: Value = serde_json::from_slice(&bytes)
            .map_err(|_| ConnectorError::InvalidJson { url: url.clone() })?;

        if !response.is_success() {
            let message = first_error_title(&json).unwrap_or_else(|| {
                format!("{} {}", response.status(), response.status_text())
            });
            return Err(ConnectorError::Api { url, message });
        }

        Ok(json)
    }

    /// Environments of the configured property with their certificates included.
    pub async fn load_certificates(&self) -> Result<Value> {
        let path = format!(
            "/properties/{}/environments?page[size]=999&page[number]=1&filter[environment_id]=NOT%20null&include=adobe_certificate",
            self.settings.property_id
        );

        match self.fetch_json(&path).await {
            Err(ConnectorError::Http(message)) => Err(ConnectorError::Load { url: path, message }),
            other => other,
        }
    }
}

// ── Certificate status table ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Valid,
    ExpiringSoon,
    Expired,
    Missing,
}

impl CertificateStatus {
    pub fn label(self) -> &'static str {
        match self {
            CertificateStatus::Valid => "Valid",
            CertificateStatus::ExpiringSoon => "Expiring soon",
            CertificateStatus::Expired => "Expired",
            CertificateStatus::Missing => "No certificate",
        }
    }

    fn from_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match expires_at {
            None => CertificateStatus::Missing,
            Some(at) if at <= now => CertificateStatus::Expired,
            Some(at) if at - now <= Duration::days(EXPIRY_WARNING_DAYS) => {
                CertificateStatus::ExpiringSoon
            }
            Some(_) => CertificateStatus::Valid,
        }
    }
}

/// One row of the certificate status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateStatusRow {
    pub environment: String,
    pub environment_url: String,
    pub status: CertificateStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

fn certificate_expiry(document: &Value, certificate_id: &str) -> Option<DateTime<Utc>> {
    document
        .get("included")?
        .as_array()?
        .iter()
        .filter(|record| record.get("type").and_then(Value::as_str) == Some(CERTIFICATE_TYPE))
        .find(|record| record.get("id").and_then(Value::as_str) == Some(certificate_id))?
        .pointer("/attributes/expires_at")?
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc))
}

/// Join the environments of a `load_certificates` document with their
/// included certificate records.
pub fn certificate_status_rows(
    document: &Value,
    settings: &FetchSettings,
    now: DateTime<Utc>,
) -> Vec<CertificateStatusRow> {
    let Some(environments) = document.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    environments
        .iter()
        .filter_map(|env| {
            let id = env.get("id")?.as_str()?;
            let name = env
                .pointer("/attributes/name")
                .and_then(Value::as_str)
                .unwrap_or(id);
            let expires_at = env
                .pointer("/relationships/adobe_certificate/data/id")
                .and_then(Value::as_str)
                .and_then(|cert_id| certificate_expiry(document, cert_id));
            Some(CertificateStatusRow {
                environment: name.to_string(),
                environment_url: settings.environment_url(id),
                status: CertificateStatus::from_expiry(expires_at, now),
                expires_at,
            })
        })
        .collect()
}
