use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::provider::ProviderKind;

/// Environment variable consulted for the OpenWeather key when the file has none.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// provider = "openweather"
/// openweather_api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Explicit provider override, e.g. "openweather" or "open-meteo".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openweather_api_key: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "daily-report", "daily-report")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Fill the API key from the environment when the file doesn't carry one.
    pub fn with_env_overrides(self) -> Self {
        self.with_api_key_fallback(std::env::var(API_KEY_ENV).ok())
    }

    fn with_api_key_fallback(mut self, key: Option<String>) -> Self {
        if self.api_key().is_none() {
            self.openweather_api_key = key.filter(|k| !k.trim().is_empty());
        }
        self
    }

    /// OpenWeather key, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.openweather_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Decide which provider to use. Called once at startup.
    ///
    /// An explicit `provider` wins; otherwise the keyed provider is used
    /// exactly when a key is configured.
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        match self.provider.as_deref() {
            Some(name) => ProviderKind::try_from(name),
            None if self.api_key().is_some() => Ok(ProviderKind::OpenWeather),
            None => Ok(ProviderKind::OpenMeteo),
        }
    }

    /// Record a provider choice, storing its key when it takes one.
    pub fn set_provider(&mut self, kind: ProviderKind, api_key: Option<String>) {
        self.provider = Some(kind.as_str().to_string());
        if let Some(key) = api_key {
            self.openweather_api_key = Some(key);
        }
    }
}
