use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::api::DEFAULT_TIMEOUT;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "TYPHOON_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_view(view: &str) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.view = Some(view.to_string());
        config.save()
    }

    /// Base URL for the chat API: command line, then env var, then file.
    /// Blank values are skipped.
    pub fn resolve_api_url(&self, cli: Option<&str>, env: Option<&str>) -> String {
        [cli, env, self.api_url.as_deref()]
            .into_iter()
            .flatten()
            .find(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }

    /// A zero timeout would fail every request, so it counts as unset.
    pub fn resolve_timeout(&self, cli_secs: Option<u64>) -> Duration {
        [cli_secs, self.request_timeout_secs]
            .into_iter()
            .flatten()
            .find(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("typhoon").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_url: Some("https://chat.example.com".to_string()),
            view: Some("rich".to_string()),
            request_timeout_secs: Some(30),
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "view": "compact" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.view.as_deref(), Some("compact"));
        assert!(config.api_url.is_none());
    }

    #[test]
    fn test_api_url_precedence() {
        let config = Config {
            api_url: Some("http://file".to_string()),
            ..Config::new()
        };

        assert_eq!(config.resolve_api_url(Some("http://cli"), Some("http://env")), "http://cli");
        assert_eq!(config.resolve_api_url(None, Some("http://env")), "http://env");
        assert_eq!(config.resolve_api_url(None, None), "http://file");
        assert_eq!(Config::new().resolve_api_url(None, None), DEFAULT_API_URL);

        // Blank overrides fall through to the next source
        assert_eq!(config.resolve_api_url(None, Some("")), "http://file");
        assert_eq!(config.resolve_api_url(Some("  "), Some("http://env")), "http://env");
        assert_eq!(Config::new().resolve_api_url(Some(""), Some("")), DEFAULT_API_URL);
    }

    #[test]
    fn test_timeout_precedence() {
        let config = Config {
            request_timeout_secs: Some(10),
            ..Config::new()
        };

        assert_eq!(config.resolve_timeout(Some(3)), Duration::from_secs(3));
        assert_eq!(config.resolve_timeout(None), Duration::from_secs(10));
        assert_eq!(Config::new().resolve_timeout(None), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_zero_timeout_is_ignored() {
        let config = Config {
            request_timeout_secs: Some(10),
            ..Config::new()
        };
        assert_eq!(config.resolve_timeout(Some(0)), Duration::from_secs(10));

        let zero = Config {
            request_timeout_secs: Some(0),
            ..Config::new()
        };
        assert_eq!(zero.resolve_timeout(None), DEFAULT_TIMEOUT);
    }
}
