use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::json;

use connector_core::config::{self, ConnectorConfig};
use connector_http::panel::form_values;
use connector_http::reactor::{self, CertificateStatusRow, FetchSettings, ReactorClient};
use connector_http::{
    HttpMethod, InitInfo, RequestPanel, RequestSettings, ReqwestTransport, RuleStash,
};

#[derive(Subcommand)]
pub enum Commands {
    /// Print the editable form values for a settings file
    Form {
        /// Persisted settings JSON
        settings: PathBuf,
    },

    /// Load a settings file into the panel and print the normalized
    /// settings with any validation errors
    Settings {
        /// Persisted settings JSON
        settings: PathBuf,
    },

    /// Send the configured request and print the connector stash
    Send {
        /// Persisted settings JSON
        settings: PathBuf,

        /// Rule stash JSON from previous actions of the rule
        #[arg(long)]
        stash: Option<PathBuf>,

        /// Send with this method instead of the saved one
        #[arg(long, value_parser = parse_method)]
        method: Option<HttpMethod>,
    },

    /// Print the event forwarding certificate status of the property
    Certificates,

    /// Print the effective config (file plus flags)
    Config {
        /// Write the effective config back to the config file
        #[arg(long)]
        save: bool,
    },
}

fn parse_method(s: &str) -> Result<HttpMethod, String> {
    HttpMethod::from_str(s).ok_or_else(|| {
        let known: Vec<&str> = HttpMethod::ALL.iter().map(|m| m.as_str()).collect();
        format!("unknown method {s:?}, expected one of {}", known.join(", "))
    })
}

/// Command-line values that win over the config file.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// IMS organization id
    #[arg(long, global = true)]
    ims_org_id: Option<String>,

    /// Platform API access token
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Platform API endpoint, overriding production/staging
    #[arg(long, global = true)]
    api_endpoint: Option<String>,

    /// Use the staging platform
    #[arg(long, global = true)]
    staging: bool,

    #[arg(long, global = true)]
    company_id: Option<String>,

    #[arg(long, global = true)]
    property_id: Option<String>,
}

impl Overrides {
    pub fn apply(self, config: &mut ConnectorConfig) {
        if let Some(v) = self.ims_org_id {
            config.ims_org_id = Some(v);
        }
        if let Some(v) = self.access_token {
            config.access_token = Some(v);
        }
        if let Some(v) = self.api_endpoint {
            config.api_endpoint = Some(v);
        }
        if self.staging {
            config.staging = true;
        }
        if let Some(v) = self.company_id {
            config.company_id = Some(v);
        }
        if let Some(v) = self.property_id {
            config.property_id = Some(v);
        }
    }
}

pub async fn execute(
    command: Commands,
    config: &ConnectorConfig,
    config_path: &Path,
) -> Result<()> {
    match command {
        Commands::Form { settings } => {
            let settings: RequestSettings = read_json(&settings)?;
            print_json(&form_values(settings))
        }
        Commands::Settings { settings } => {
            let settings: RequestSettings = read_json(&settings)?;
            let mut panel = RequestPanel::with_fetch_settings(FetchSettings::from_config(config));
            panel.init(init_info(settings, config));
            let errors = panel.validate();
            print_json(&json!({
                "settings": panel.get_settings(),
                "errors": errors,
            }))
        }
        Commands::Send {
            settings,
            stash,
            method,
        } => {
            let mut settings: RequestSettings = read_json(&settings)?;
            if let Some(method) = method {
                settings.method = method;
            }
            let rule_stash = match stash {
                Some(path) => read_json(&path)?,
                None => RuleStash::new(),
            };
            let transport = ReqwestTransport::new();
            let stash = connector_http::dispatch(&settings, &rule_stash, &transport)
                .await
                .with_context(|| format!("Request to {} failed", settings.url))?;
            print_json(&stash)
        }
        Commands::Certificates => {
            let fetch_settings = FetchSettings::from_config(config);
            let transport = ReqwestTransport::new();
            let document = ReactorClient::new(&fetch_settings, &transport)
                .load_certificates()
                .await?;
            let rows = reactor::certificate_status_rows(&document, &fetch_settings, Utc::now());
            print!("{}", render_certificates(&rows));
            Ok(())
        }
        Commands::Config { save } => {
            if save {
                config::save_config(config_path, config)?;
                log::info!("Config saved to {}", config_path.display());
            }
            print_json(&redacted(config))
        }
    }
}

/// The config as printed: the access token is masked.
fn redacted(config: &ConnectorConfig) -> ConnectorConfig {
    ConnectorConfig {
        access_token: config.access_token.as_ref().map(|_| "********".to_string()),
        ..config.clone()
    }
}

fn init_info(settings: RequestSettings, config: &ConnectorConfig) -> InitInfo {
    InitInfo {
        settings: Some(settings),
        company_id: config.company_id.clone(),
        ims_org_id: config.ims_org_id.clone(),
        access_token: config.access_token.clone(),
        property_id: config.property_id.clone(),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Plain-text certificate status table, one environment per line.
fn render_certificates(rows: &[CertificateStatusRow]) -> String {
    if rows.is_empty() {
        return "No environments found.\n".to_string();
    }

    let name_width = rows
        .iter()
        .map(|r| r.environment.len())
        .max()
        .unwrap_or(0)
        .max("ENVIRONMENT".len());

    let mut out = format!(
        "{:<name_width$}  {:<14}  {:<10}  URL\n",
        "ENVIRONMENT", "STATUS", "EXPIRES"
    );
    for row in rows {
        let expires = row
            .expires_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<name_width$}  {:<14}  {:<10}  {}\n",
            row.environment,
            row.status.label(),
            expires,
            row.environment_url
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use connector_http::reactor::CertificateStatus;

    #[test]
    fn test_overrides_win_over_config() {
        let mut config = ConnectorConfig {
            ims_org_id: Some("file-org".to_string()),
            access_token: Some("file-token".to_string()),
            property_id: Some("PR1".to_string()),
            ..Default::default()
        };
        Overrides {
            access_token: Some("flag-token".to_string()),
            staging: true,
            ..Default::default()
        }
        .apply(&mut config);

        assert_eq!(config.ims_org_id.as_deref(), Some("file-org"));
        assert_eq!(config.access_token.as_deref(), Some("flag-token"));
        assert_eq!(config.property_id.as_deref(), Some("PR1"));
        assert!(config.staging);
    }

    #[test]
    fn test_init_info_from_config() {
        let config = ConnectorConfig {
            company_id: Some("CO1".to_string()),
            ..Default::default()
        };
        let info = init_info(RequestSettings::default(), &config);
        assert_eq!(info.company_id.as_deref(), Some("CO1"));
        assert_eq!(info.settings, Some(RequestSettings::default()));
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("patch"), Ok(HttpMethod::Patch));
        let err = parse_method("TRACE").unwrap_err();
        assert!(err.contains("GET, POST, PUT, PATCH, DELETE"));
    }

    #[test]
    fn test_redacted_masks_token() {
        let config = ConnectorConfig {
            ims_org_id: Some("org".to_string()),
            access_token: Some("secret".to_string()),
            ..Default::default()
        };
        let shown = redacted(&config);
        assert_eq!(shown.access_token.as_deref(), Some("********"));
        assert_eq!(shown.ims_org_id.as_deref(), Some("org"));
        assert_eq!(redacted(&ConnectorConfig::default()).access_token, None);
    }

    #[tokio::test]
    async fn test_config_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connector/config.json");
        let config = ConnectorConfig {
            property_id: Some("PR1".to_string()),
            ..Default::default()
        };

        execute(Commands::Config { save: true }, &config, &path)
            .await
            .unwrap();
        assert_eq!(config::load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_render_certificates() {
        let rows = vec![
            CertificateStatusRow {
                environment: "Production".to_string(),
                environment_url: "https://example.com/env/EN1".to_string(),
                status: CertificateStatus::Valid,
                expires_at: Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap()),
            },
            CertificateStatusRow {
                environment: "Dev".to_string(),
                environment_url: "https://example.com/env/EN2".to_string(),
                status: CertificateStatus::Missing,
                expires_at: None,
            },
        ];

        let table = render_certificates(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ENVIRONMENT"));
        assert!(lines[1].contains("Valid") && lines[1].contains("2027-01-01"));
        assert!(lines[2].contains("No certificate") && lines[2].contains(" - "));
    }

    #[test]
    fn test_render_no_certificates() {
        assert_eq!(render_certificates(&[]), "No environments found.\n");
    }
}
