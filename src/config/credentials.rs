use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config::ConfigError;

const DEFAULT_DATABASE: &str = "portfolio";

/// Contents of the service credential file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Credentials {
    pub connection_uri: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub app_name: Option<String>,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingCredentials(path.to_path_buf()));
        }

        let raw = fs::read_to_string(path)?;
        let creds: Credentials = serde_json::from_str(&raw)
            .map_err(|e| ConfigError::InvalidCredentials {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if creds.connection_uri.trim().is_empty() {
            return Err(ConfigError::InvalidCredentials {
                path: path.to_path_buf(),
                reason: "connection_uri is empty".to_string(),
            });
        }

        Ok(creds)
    }
}
