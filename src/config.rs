//! Configuration management for the admin console using the prefer crate.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::RetryPolicy;

/// Default backend base URL (the admin Flask app in local deployments).
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the admin backend.
    pub base_url: String,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Total request attempts, including the first.
    pub retry_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Backoff ceiling, in milliseconds.
    pub retry_max_delay_ms: u64,
    /// Directory where confirmed offer letters and downloads land.
    pub download_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        let download_dir = dirs::download_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("internadmin");

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("internadmin/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: 30,
            retry_attempts: 4,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 8_000,
            download_dir,
        }
    }
}

impl Settings {
    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Retry schedule derived from the configured knobs.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    /// Ensure the download directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.download_dir)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// Total request attempts, including the first.
    #[serde(default)]
    pub retry_attempts: Option<u32>,
    /// Delay before the first retry, in milliseconds.
    #[serde(default)]
    pub retry_base_delay_ms: Option<u64>,
    /// Backoff ceiling, in milliseconds.
    #[serde(default)]
    pub retry_max_delay_ms: Option<u64>,
    /// Download directory; `~` is expanded.
    #[serde(default)]
    pub download_dir: Option<String>,
}

impl Config {
    /// Load configuration using the prefer crate.
    /// Automatically discovers internadmin config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("internadmin").await {
            Ok(pref_config) => {
                let base_url: Option<String> = pref_config.get("base_url").ok();
                let user_agent: Option<String> = pref_config.get("user_agent").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let retry_attempts: Option<u32> = pref_config.get("retry_attempts").ok();
                let retry_base_delay_ms: Option<u64> =
                    pref_config.get("retry_base_delay_ms").ok();
                let retry_max_delay_ms: Option<u64> =
                    pref_config.get("retry_max_delay_ms").ok();
                let download_dir: Option<String> = pref_config.get("download_dir").ok();

                Config {
                    base_url,
                    user_agent,
                    request_timeout,
                    retry_attempts,
                    retry_base_delay_ms,
                    retry_max_delay_ms,
                    download_dir,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(attempts) = self.retry_attempts {
            settings.retry_attempts = attempts;
        }
        if let Some(base) = self.retry_base_delay_ms {
            settings.retry_base_delay_ms = base;
        }
        if let Some(max) = self.retry_max_delay_ms {
            settings.retry_max_delay_ms = max;
        }
        if let Some(ref dir) = self.download_dir {
            let path = shellexpand::tilde(dir);
            settings.download_dir = PathBuf::from(path.as_ref());
        }
    }
}

/// Load settings from configuration (async version).
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings
}
