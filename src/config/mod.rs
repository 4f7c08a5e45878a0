//! Settings and configuration module
//!
//! Provides unified configuration with:
//! - Builder-style setters
//! - JSON loading
//! - camelCase field names matching the deployed site config

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::ai::AiConfig;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid api url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Client configuration.
///
/// Mirrors the deployed site config, so a JSON file written for the admin
/// frontend loads unchanged; fields this client has no use for are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// API origin, stored without a trailing slash.
    pub api_url: String,
    /// Public blog origin, when different from the API.
    pub blog_url: Option<String>,
    /// Site key for the challenge widget. `None` disables the challenge
    /// retry path for the whole deployment.
    pub turnstile_site_key: Option<String>,
    pub timeout_ms: u64,
    /// Whether failures pop an alert by default.
    pub show_alert: bool,
    /// Durable token store location. `None` keeps tokens in memory only.
    pub token_db_path: Option<PathBuf>,
    pub ai: Option<AiConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            blog_url: None,
            turnstile_site_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            show_alert: true,
            token_db_path: None,
            ai: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: trim_base(api_url.into()),
            ..Self::default()
        }
    }

    /// Loads and validates a JSON config string.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.api_url = trim_base(config.api_url);
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.api_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.api_url.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn with_site_key(mut self, site_key: impl Into<String>) -> Self {
        self.turnstile_site_key = Some(site_key.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_token_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_db_path = Some(path.into());
        self
    }

    pub fn with_ai(mut self, ai: AiConfig) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn without_alerts(mut self) -> Self {
        self.show_alert = false;
        self
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
