//! Configuration management

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{IptvClient, CHANNELS_ENDPOINT, STREAMS_ENDPOINT};
use crate::error::ConfigError;
use crate::resolver::{ResolveOptions, DEFAULT_MAX_STREAMS_SCANNED, DEFAULT_MINIMUM_COUNT, DEFAULT_TARGET_COUNT};

pub const MAX_TIME_BUDGET_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_channels_endpoint")]
    pub channels_endpoint: String,
    #[serde(default = "default_streams_endpoint")]
    pub streams_endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    // Whole load cycle, both fetches plus resolution
    #[serde(default = "default_time_budget")]
    pub time_budget_secs: u64,
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    #[serde(default = "default_minimum_count")]
    pub minimum_count: usize,
    #[serde(default = "default_max_streams_scanned")]
    pub max_streams_scanned: usize,
    /// Play this URL instead of the resolved stream (demo builds)
    #[serde(default)]
    pub override_stream_url: String,
}

fn default_channels_endpoint() -> String { CHANNELS_ENDPOINT.to_string() }
fn default_streams_endpoint() -> String { STREAMS_ENDPOINT.to_string() }
fn default_user_agent() -> String { "XtremeIPTV/1.0".to_string() }
fn default_connect_timeout() -> u64 { 10 }
fn default_request_timeout() -> u64 { 30 }
fn default_time_budget() -> u64 { 10 }
fn default_target_count() -> usize { DEFAULT_TARGET_COUNT }
fn default_minimum_count() -> usize { DEFAULT_MINIMUM_COUNT }
fn default_max_streams_scanned() -> usize { DEFAULT_MAX_STREAMS_SCANNED }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            channels_endpoint: default_channels_endpoint(),
            streams_endpoint: default_streams_endpoint(),
            user_agent: default_user_agent(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            time_budget_secs: 10,
            target_count: DEFAULT_TARGET_COUNT,
            minimum_count: DEFAULT_MINIMUM_COUNT,
            max_streams_scanned: DEFAULT_MAX_STREAMS_SCANNED,
            override_stream_url: String::new(),
        }
    }
}

impl AppConfig {
    fn config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("livetv_resolver");
        fs::create_dir_all(&path).ok();
        path.push("config.json");
        path
    }

    /// Load from the user config dir, defaults if missing or unreadable
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring config at {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Counts with `target >= 1` and `minimum <= target`
    pub fn resolve_options(&self) -> ResolveOptions {
        let target_count = self.target_count.max(1);
        ResolveOptions {
            target_count,
            minimum_count: self.minimum_count.min(target_count),
            max_streams_scanned: self.max_streams_scanned,
        }
    }

    /// Load cycle budget, between 1 second and `MAX_TIME_BUDGET_SECS`
    pub fn time_budget(&self) -> Duration {
        Duration::from_secs(self.time_budget_secs.clamp(1, MAX_TIME_BUDGET_SECS))
    }

    pub fn override_url(&self) -> Option<&str> {
        let url = self.override_stream_url.trim();
        (!url.is_empty()).then_some(url)
    }

    pub fn client(&self) -> IptvClient {
        IptvClient::new(&self.channels_endpoint, &self.streams_endpoint)
            .with_user_agent(&self.user_agent)
            .with_timeouts(
                Duration::from_secs(self.connect_timeout_secs),
                Duration::from_secs(self.request_timeout_secs),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"target_count": 24, "time_budget_secs": 5}"#).unwrap();
        assert_eq!(config.target_count, 24);
        assert_eq!(config.time_budget(), Duration::from_secs(5));
        assert_eq!(config.minimum_count, DEFAULT_MINIMUM_COUNT);
        assert_eq!(config.streams_endpoint, STREAMS_ENDPOINT);
    }

    #[test]
    fn test_resolve_options_sanitized() {
        let config = AppConfig {
            target_count: 0,
            minimum_count: 50,
            ..AppConfig::default()
        };
        let options = config.resolve_options();
        assert_eq!(options.target_count, 1);
        assert_eq!(options.minimum_count, 1);

        assert_eq!(AppConfig::default().resolve_options(), ResolveOptions::default());
    }

    #[test]
    fn test_time_budget_clamped() {
        let config: AppConfig = serde_json::from_str(r#"{"time_budget_secs": 18446744073709551615}"#).unwrap();
        assert_eq!(config.time_budget(), Duration::from_secs(MAX_TIME_BUDGET_SECS));

        let zero = AppConfig {
            time_budget_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(zero.time_budget(), Duration::from_secs(1));
    }

    #[test]
    fn test_override_url() {
        let mut config = AppConfig::default();
        assert_eq!(config.override_url(), None);
        config.override_stream_url = "  https://demo/master.m3u8 ".to_string();
        assert_eq!(config.override_url(), Some("https://demo/master.m3u8"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = AppConfig {
            max_streams_scanned: 500,
            user_agent: "Tester".to_string(),
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Json(_))));
    }
}
