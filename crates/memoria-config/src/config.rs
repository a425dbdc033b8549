//! Configuration management for the client core.

use crate::{CoreResult, Paths};
use memoria_platform::{BackendOverrides, Platform};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default backend URL (can be set at compile time via MEMORIA_BACKEND_URL).
pub const DEFAULT_BACKEND_URL: Option<&str> = option_env!("MEMORIA_BACKEND_URL");

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Backend base URL for all platforms, unless overridden per platform.
    #[serde(default = "default_backend_url")]
    pub backend_url: Option<String>,
    /// Per-platform backend URL override (web).
    #[serde(default)]
    pub backend_url_web: Option<String>,
    /// Per-platform backend URL override (iOS).
    #[serde(default)]
    pub backend_url_ios: Option<String>,
    /// Per-platform backend URL override (Android).
    #[serde(default)]
    pub backend_url_android: Option<String>,
}

fn default_backend_url() -> Option<String> {
    DEFAULT_BACKEND_URL.map(|s| s.to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            backend_url: default_backend_url(),
            backend_url_web: None,
            backend_url_ios: None,
            backend_url_android: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file, falling back to defaults.
    /// Environment variables win over file values.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("MEMORIA_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(url) = std::env::var("MEMORIA_BACKEND_URL") {
            self.backend_url = non_empty(url);
        }
        if let Ok(url) = std::env::var("MEMORIA_BACKEND_URL_WEB") {
            self.backend_url_web = non_empty(url);
        }
        if let Ok(url) = std::env::var("MEMORIA_BACKEND_URL_IOS") {
            self.backend_url_ios = non_empty(url);
        }
        if let Ok(url) = std::env::var("MEMORIA_BACKEND_URL_ANDROID") {
            self.backend_url_android = non_empty(url);
        }
    }

    /// Build the platform override table from the per-platform entries.
    ///
    /// Entries that fail to parse as URLs are dropped with a warning rather
    /// than failing startup.
    pub fn backend_overrides(&self) -> BackendOverrides {
        let mut overrides = BackendOverrides::new();
        for (platform, raw) in [
            (Platform::Web, &self.backend_url_web),
            (Platform::Ios, &self.backend_url_ios),
            (Platform::Android, &self.backend_url_android),
        ] {
            if let Some(raw) = raw {
                match Url::parse(raw) {
                    Ok(url) => overrides.set(platform, Some(url)),
                    Err(e) => {
                        tracing::warn!(platform = %platform, url = %raw, error = %e,
                            "Ignoring unparsable backend override");
                    }
                }
            }
        }
        overrides
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
