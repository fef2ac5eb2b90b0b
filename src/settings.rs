//! Console settings: where the license server lives and how long to wait for it.
//!
//! Settings are read from `settings.toml` in the app's config directory:
//! - macOS: ~/Library/Application Support/license-console/settings.toml
//! - Windows: %APPDATA%/license-console/settings.toml
//! - Linux: ~/.config/license-console/settings.toml
//!
//! Environment variables override the file; CLI flags override both.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

const APP_NAME: &str = "license-console";
const SETTINGS_FILE: &str = "settings.toml";

pub const ENV_SERVER_URL: &str = "LICENSE_CONSOLE_SERVER_URL";
pub const ENV_TIMEOUT_SECS: &str = "LICENSE_CONSOLE_TIMEOUT_SECS";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to get config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Base URL of the licensing authority
    pub server_url: String,
    /// Per-request timeout enforced by the HTTP client
    pub request_timeout_secs: u64,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ConsoleSettings {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self, SettingsError> {
        let path = settings_path()?;
        let settings = Self::load_from(&path)?;
        settings.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load from an explicit file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: ConsoleSettings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings to the default location; returns the path written
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = settings_path()?;
        self.save_to(&path)?;
        tracing::info!(path = %path.display(), "Console settings saved");
        Ok(path)
    }

    /// Write settings to an explicit file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SERVER_URL) {
            self.server_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_timeout(&raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Parsed server URL
    pub fn server_url(&self) -> Result<Url, SettingsError> {
        let url = Url::parse(&self.server_url).map_err(|e| SettingsError::InvalidUrl {
            url: self.server_url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SettingsError::InvalidUrl {
                url: self.server_url.clone(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        self.server_url()?;
        if self.request_timeout_secs == 0 {
            return Err(SettingsError::InvalidTimeout("0".to_string()));
        }
        Ok(())
    }
}

/// Path of the settings file in the app's config directory
pub fn settings_path() -> Result<PathBuf, SettingsError> {
    let config_dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(config_dir.join(APP_NAME).join(SETTINGS_FILE))
}

fn parse_timeout(raw: &str) -> Result<u64, SettingsError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(SettingsError::InvalidTimeout(raw.to_string())),
    }
}
