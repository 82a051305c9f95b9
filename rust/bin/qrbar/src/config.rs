//! Client configuration: where the code store lives.
//!
//! The base URL is resolved once at startup, first match wins:
//! `--api-url` flag, `QRBAR_API_URL`, `api_url` in the config file
//! (default `~/.qrbar/config.toml`), then `http://localhost:8000`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const API_URL_ENV: &str = "QRBAR_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("API URL must start with http:// or https://, got \"{0}\"")]
    InvalidUrl(String),
}

/// Contents of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the code store (e.g. "http://localhost:8000").
    #[serde(default)]
    pub api_url: Option<String>,
}

impl ClientConfig {
    /// Default config file path: ~/.qrbar/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Pick the base URL from flag, environment, file, or default.
    pub fn resolve_api_url(
        &self,
        flag: Option<&str>,
        env: Option<&str>,
    ) -> Result<String, ConfigError> {
        let raw = non_blank(flag)
            .or_else(|| non_blank(env))
            .or_else(|| non_blank(self.api_url.as_deref()))
            .unwrap_or(DEFAULT_API_URL);

        if !(raw.starts_with("http://") || raw.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(raw.to_string()));
        }
        Ok(raw.trim_end_matches('/').to_string())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Return the QRBar config directory (~/.qrbar).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".qrbar")
}
