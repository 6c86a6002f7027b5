// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration for the workout backend, the weather provider and the
//! on-device store.
//!
//! Loads a TOML file when one exists (default location under the user config
//! directory), otherwise falls back to environment variables (with `.env`
//! support). A missing weather API key disables weather features only;
//! workout features never depend on it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_WEATHER_API_URL: &str = "https://api.weatherapi.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workout backend settings
    pub api: ApiConfig,
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,
    /// On-device key-value store settings
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the workout REST backend
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather provider API key; absent means weather features are disabled
    pub api_key: Option<String>,
    /// Weather provider base URL
    #[serde(default = "default_weather_api_url")]
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory backing the key-value store
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
    /// Optional passphrase for at-rest encryption of stored values
    pub encryption_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            encryption_key: None,
        }
    }
}

fn default_weather_api_url() -> String {
    DEFAULT_WEATHER_API_URL.to_string()
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("workout-companion"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

impl AppConfig {
    /// Load configuration from `path`, the default config file, or the
    /// environment, in that order of preference.
    pub fn load(path: Option<String>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| {
            dirs::config_dir()
                .map(|p| p.join("workout-companion/config.toml"))
                .unwrap_or_else(|| "config.toml".into())
                .to_string_lossy()
                .to_string()
        });

        if Path::new(&config_path).exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {config_path}"))?;
            let config: AppConfig = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {config_path}"))?;
            config.warn_if_weather_disabled();
            Ok(config)
        } else {
            Self::from_env()
        }
    }

    /// Build configuration from environment variables (`.env` supported).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let base_url = env::var("API_URL")
            .context("API_URL must be set to the workout backend base URL")?;

        let weather = WeatherConfig {
            api_key: env::var("WEATHER_API_KEY").ok(),
            base_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| default_weather_api_url()),
        };

        let storage = StorageConfig {
            dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_storage_dir()),
            encryption_key: env::var("STORAGE_ENCRYPTION_KEY").ok(),
        };

        let config = AppConfig {
            api: ApiConfig { base_url },
            weather,
            storage,
        };
        config.warn_if_weather_disabled();
        Ok(config)
    }

    fn warn_if_weather_disabled(&self) {
        if self.weather.api_key.is_none() {
            warn!("no weather API key configured; weather features are disabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config_file() {
        let config: AppConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://localhost:3000"

            [weather]
            api_key = "k-123"

            [storage]
            dir = "/tmp/workout-companion"
            encryption_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.weather.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.weather.base_url, DEFAULT_WEATHER_API_URL);
        assert_eq!(config.storage.dir, PathBuf::from("/tmp/workout-companion"));
        assert_eq!(config.storage.encryption_key.as_deref(), Some("secret"));
    }

    #[test]
    fn weather_and_storage_sections_are_optional() {
        let config: AppConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://localhost:3000"
            "#,
        )
        .unwrap();

        assert!(config.weather.api_key.is_none());
        assert_eq!(config.weather.base_url, DEFAULT_WEATHER_API_URL);
        assert!(config.storage.encryption_key.is_none());
    }
}
