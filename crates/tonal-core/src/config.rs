//! Client and application configuration.
//!
//! `ClientConfig` carries the endpoints, timeouts and retry limits used by
//! the session and request layers. Defaults match the production backend;
//! `ClientConfig::from_env` lets deployments and tests point elsewhere.
//!
//! `Config` is the small persisted preference file used by front ends,
//! stored at `~/.config/tonal/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Constants
// ============================================================================

/// Application name used for config/cache directory paths
const APP_NAME: &str = "tonal";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Identity provider token endpoint (password and refresh grants)
pub const DEFAULT_AUTH_URL: &str = "https://tonal.auth0.com/oauth/token";

/// Public client identifier registered with the identity provider
pub const DEFAULT_CLIENT_ID: &str = "ERCyexW-xoVG_Yy3RDe-eV4xsOnRHP6L";

/// Base URL for all data endpoints
pub const DEFAULT_API_BASE_URL: &str = "https://api.tonal.com/v6";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Total attempts per logical request, including the first one.
const MAX_ATTEMPTS: u32 = 3;

/// Delay before the second attempt; doubles for each attempt after that.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Upper bound on a single backoff delay.
const MAX_BACKOFF_SECS: u64 = 10;

/// A credential stops being used this long before its nominal expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Movement catalog changes rarely; keep it for a day.
const CACHE_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub auth_url: String,
    pub client_id: String,
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    /// `None` leaves exponential backoff uncapped.
    pub max_backoff: Option<Duration>,
    pub expiry_skew: chrono::Duration,
    /// On-disk response cache location. `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_attempts: MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Some(Duration::from_secs(MAX_BACKOFF_SECS)),
            expiry_skew: chrono::Duration::seconds(EXPIRY_SKEW_SECS),
            cache_dir: None,
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `TONAL_*` environment variables.
    ///
    /// Unparseable numeric values are ignored with a warning rather than
    /// failing, so a typo never prevents login.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("TONAL_AUTH_URL") {
            config.auth_url = url;
        }
        if let Ok(url) = std::env::var("TONAL_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(id) = std::env::var("TONAL_CLIENT_ID") {
            config.client_id = id;
        }
        if let Some(secs) = env_number::<u64>("TONAL_REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = env_number::<u32>("TONAL_MAX_RETRIES") {
            config.max_attempts = attempts.max(1);
        }
        if let Ok(dir) = std::env::var("TONAL_CACHE_DIR") {
            config.cache_dir = Some(PathBuf::from(dir));
        }

        config
    }

    /// Use the platform cache directory (`~/.cache/tonal`) for responses.
    pub fn with_default_cache_dir(mut self) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        self.cache_dir = Some(cache_dir.join(APP_NAME));
        Ok(self)
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key = key, value = %raw, "Ignoring invalid numeric environment value");
            None
        }
    }
}

/// Persisted front-end preferences.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.auth_url, "https://tonal.auth0.com/oauth/token");
        assert_eq!(config.api_base_url, "https://api.tonal.com/v6");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.expiry_skew, chrono::Duration::seconds(60));
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_config_tolerates_missing_fields() {
        let parsed: Config = serde_json::from_str("{}").expect("parse empty config");
        assert!(parsed.last_username.is_none());
    }
}
