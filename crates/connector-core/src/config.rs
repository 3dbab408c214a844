use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connection details for the platform API, read from the config file.
/// Every field is optional so a partial file (or none at all) still loads;
/// CLI flags fill in the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectorConfig {
    pub ims_org_id: Option<String>,
    pub access_token: Option<String>,
    /// Overrides the production/staging API endpoint.
    pub api_endpoint: Option<String>,
    pub staging: bool,
    pub company_id: Option<String>,
    pub property_id: Option<String>,
}

/// Returns the path to the connector config file.
/// Location: `~/.config/connector/config.json` (XDG-compliant)
pub fn config_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "connector").context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.json"))
}

/// Load the config from `path`. A missing file yields the default config.
pub fn load_config(path: &Path) -> Result<ConnectorConfig> {
    if !path.exists() {
        log::debug!("No config file at {}, using defaults", path.display());
        return Ok(ConnectorConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    log::debug!("Config loaded from: {}", path.display());
    Ok(config)
}

/// Write the config to `path`, creating parent directories.
pub fn save_config(path: &Path, config: &ConnectorConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let raw = serde_json::to_string_pretty(config)?;
    std::fs::write(path, raw)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    Ok(())
}
