/// Client configuration loader - parses coastal_monitoring.toml
///
/// Keeps the referer, endpoint root and timeout out of code. The API key is
/// a secret: it may live in the file, but the usual place is the
/// `COASTAL_MONITORING_API_KEY` environment variable (a `.env` file in the
/// working directory is honoured).

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::model::{BASE_URL, ClientError};

pub const API_KEY_ENV: &str = "COASTAL_MONITORING_API_KEY";
pub const REFERER_ENV: &str = "COASTAL_MONITORING_REFERER";

/// Applied when no timeout is configured. The service has no documented
/// timeout; a blocking client without one can hang forever.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Runtime configuration
// ---------------------------------------------------------------------------

/// Everything needed to open a session against the observations API.
#[derive(Clone, PartialEq)]
pub struct ClientConfig {
    /// Personal API key, sent as `X-API-Key`.
    pub api_key: String,
    /// Web origin registered for the API key, sent as `Referer`.
    pub referer: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, referer: impl Into<String>) -> Self {
        ClientConfig {
            api_key: api_key.into(),
            referer: referer.into(),
            base_url: BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds a config purely from `COASTAL_MONITORING_API_KEY` and
    /// `COASTAL_MONITORING_REFERER`.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenv::dotenv().ok();
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| ClientError::config(format!("{} is not set", API_KEY_ENV)))?;
        let referer = std::env::var(REFERER_ENV)
            .map_err(|_| ClientError::config(format!("{} is not set", REFERER_ENV)))?;
        let config = ClientConfig::new(api_key, referer);
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the service is guaranteed to refuse.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::config("api_key must not be empty"));
        }
        if self.referer.trim().is_empty() {
            return Err(ClientError::config("referer must not be empty"));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ClientError::config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::config("timeout must be greater than zero"));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("referer", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// TOML file
// ---------------------------------------------------------------------------

/// `[client]` table of the configuration file.
#[derive(Debug, Deserialize)]
struct ClientSection {
    api_key: Option<String>,
    referer: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Deserialize)]
struct ConfigFile {
    client: ClientSection,
}

/// Loads client configuration from a TOML file.
///
/// Environment variables take precedence over the file for the API key and
/// referer, so a checked-in config never needs to carry the secret.
///
/// # Errors
/// `ClientError::Config` if the file is unreadable or malformed, or if no
/// API key / referer is available from either source.
pub fn load_config(path: &Path) -> Result<ClientConfig, ClientError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ClientError::config(format!("Failed to read {}: {}", path.display(), e)))?;

    dotenv::dotenv().ok();
    parse_config(
        &contents,
        std::env::var(API_KEY_ENV).ok(),
        std::env::var(REFERER_ENV).ok(),
    )
}

/// Parses configuration text, with optional overrides for the key and
/// referer. Split out from `load_config` so it can be tested without
/// touching the process environment.
pub fn parse_config(
    contents: &str,
    api_key_override: Option<String>,
    referer_override: Option<String>,
) -> Result<ClientConfig, ClientError> {
    let file: ConfigFile = toml::from_str(contents)
        .map_err(|e| ClientError::config(format!("Failed to parse configuration: {}", e)))?;
    let section = file.client;

    let api_key = api_key_override.or(section.api_key).ok_or_else(|| {
        ClientError::config(format!(
            "no API key: set {} or client.api_key",
            API_KEY_ENV
        ))
    })?;
    let referer = referer_override.or(section.referer).ok_or_else(|| {
        ClientError::config(format!(
            "no referer: set {} or client.referer",
            REFERER_ENV
        ))
    })?;

    let mut config = ClientConfig::new(api_key, referer);
    if let Some(base_url) = section.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(secs) = section.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    config.validate()?;
    Ok(config)
}
