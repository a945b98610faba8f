use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const BASE_URL_ENV: &str = "RRREAD_BASE_URL";
pub const CONFIG_FILE: &str = "config.toml";

/// Client configuration read from `config.toml` in the data directory
///
/// Every field is optional in the file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    /// Seconds between two status checks
    pub poll_interval_secs: u64,
    /// Maximum number of status checks per attempt, 0 for no limit
    pub max_polls: u32,
    pub request_timeout_secs: u64,
    /// Vault the archive is merged into (defaults to the current directory)
    pub vault_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_secs: 10,
            max_polls: 360,
            request_timeout_secs: 60,
            vault_dir: None,
        }
    }
}

impl ClientConfig {
    /// Loads the config file if present and applies environment overrides
    pub fn load(data_dir: &Path) -> Result<Self, AppError> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            log::debug!("Loading client config from {}", path.display());
            Self::from_toml(&raw)?
        } else {
            Self::default()
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document
    pub fn from_toml(s: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(s)?)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_polls(&self) -> Option<u32> {
        if self.max_polls == 0 {
            None
        } else {
            Some(self.max_polls)
        }
    }

    /// Vault root, relative paths resolved against the current directory
    pub fn vault_root(&self) -> Result<PathBuf, AppError> {
        let cwd = std::env::current_dir()?;
        Ok(match &self.vault_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }
}
