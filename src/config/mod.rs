use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub mod credentials;
pub mod database;
pub mod plan;

pub const DEFAULT_CREDENTIALS_PATH: &str = "serviceAccountKey.json";
/// Commit threshold, kept below the store's 500 operation ceiling.
pub const DEFAULT_BATCH_SIZE: usize = 400;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{} not found", .0.display())]
    MissingCredentials(PathBuf),
    #[error("Invalid credentials file {}: {reason}", .path.display())]
    InvalidCredentials { path: PathBuf, reason: String },
    #[error("Invalid dedup plan: {0}")]
    InvalidPlan(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidSetting(&'static str, String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runtime settings, read from the environment after `.env` is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub credentials_path: PathBuf,
    pub plan_path: Option<PathBuf>,
    pub batch_size: usize,
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            plan_path: None,
            batch_size: DEFAULT_BATCH_SIZE,
            dry_run: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(path) = lookup("DEDUP_CREDENTIALS").filter(|v| !v.is_empty()) {
            settings.credentials_path = PathBuf::from(path);
        }

        settings.plan_path = lookup("DEDUP_PLAN")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup("DEDUP_BATCH_SIZE") {
            let size: usize = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidSetting("DEDUP_BATCH_SIZE", raw.clone()))?;
            if size == 0 || size > crate::services::store::MAX_BATCH_OPERATIONS {
                return Err(ConfigError::InvalidSetting("DEDUP_BATCH_SIZE", raw));
            }
            settings.batch_size = size;
        }

        if let Some(raw) = lookup("DEDUP_DRY_RUN") {
            settings.dry_run = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "" | "0" | "false" | "no" => false,
                _ => return Err(ConfigError::InvalidSetting("DEDUP_DRY_RUN", raw)),
            };
        }

        Ok(settings)
    }
}
