//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL for every API call, without a trailing `/`.
    pub api_url: String,
    pub timeouts: Timeouts,
    /// Where the file-backed credential store keeps the bearer token.
    pub token_path: PathBuf,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `VISION_API_URL`: default `http://localhost:8000`
    /// - `VISION_REQUEST_TIMEOUT_SECS`: default 120
    /// - `VISION_CONNECT_TIMEOUT_SECS`: default 10
    /// - `VISION_TOKEN_PATH`: default `<config dir>/visionchat/token`
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is set but is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::with_api_url(&std::env::var("VISION_API_URL").unwrap_or_default());
        config.timeouts = Timeouts {
            request_secs: env_parse_secs("VISION_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_secs("VISION_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        if let Some(path) = std::env::var("VISION_TOKEN_PATH").ok().filter(|v| !v.trim().is_empty()) {
            config.token_path = PathBuf::from(path);
        }
        Ok(config)
    }

    /// Config pointing at `api_url` with default timeouts and token path.
    #[must_use]
    pub fn with_api_url(api_url: &str) -> Self {
        Self { api_url: normalize_api_url(Some(api_url)), timeouts: Timeouts::default(), token_path: default_token_path() }
    }

    /// Replace the base URL, normalised as in [`ClientConfig::from_env`].
    pub fn set_api_url(&mut self, api_url: &str) {
        self.api_url = normalize_api_url(Some(api_url));
    }

    /// Join an API path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

fn normalize_api_url(raw: Option<&str>) -> String {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(DEFAULT_API_URL);
    raw.trim_end_matches('/').to_string()
}

fn env_parse_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Parse(format!("{key} must be a positive integer, got '{raw}'"))),
        Ok(secs) => Ok(secs),
    }
}

fn default_token_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("visionchat")
        .join("token")
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
