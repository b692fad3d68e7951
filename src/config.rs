//! Streamer configuration.
//!
//! Configuration comes from three layers, later ones winning:
//! 1. [`StreamerConfig::default`]
//! 2. A JSON file (`~/.sse-tap/config.json` unless a path is given)
//! 3. `SSE_TAP_*` environment variables
//!
//! Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::traits::{Headers, Method};

/// Directory under the home directory holding the config file.
pub const CONFIG_DIR: &str = ".sse-tap";

/// Config file name.
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the stream URL.
pub const ENV_URL: &str = "SSE_TAP_URL";

/// Environment variable overriding the request method.
pub const ENV_METHOD: &str = "SSE_TAP_METHOD";

/// Environment variable overriding [`StreamerConfig::close_on_done`].
pub const ENV_CLOSE_ON_DONE: &str = "SSE_TAP_CLOSE_ON_DONE";

/// Configuration for a [`Streamer`](crate::streamer::Streamer).
///
/// # Example
///
/// ```
/// use sse_tap::config::StreamerConfig;
///
/// let config = StreamerConfig::default()
///     .with_url("http://localhost:8000/stream")
///     .with_header("Authorization", "Bearer token")
///     .with_close_on_done(false);
/// assert!(!config.close_on_done);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Stream URL used when none is given explicitly
    pub url: Option<String>,
    /// HTTP method for stream requests (default: GET)
    pub method: Method,
    /// Extra request headers. `Accept` and `Cache-Control` are always
    /// forced to the event-stream values.
    pub headers: Headers,
    /// End the session when `data: [DONE]` arrives (default: true).
    /// When false, the sentinel only stops processing of the current
    /// increment.
    pub close_on_done: bool,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            url: None,
            method: Method::Get,
            headers: Headers::new(),
            close_on_done: true,
        }
    }
}

impl StreamerConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default stream URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the request method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add one request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set whether the `[DONE]` sentinel ends the session.
    pub fn with_close_on_done(mut self, close_on_done: bool) -> Self {
        self.close_on_done = close_on_done;
        self
    }

    /// Default config file path (`~/.sse-tap/config.json`).
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load a config file. Missing fields take their default values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the default config file, or defaults if it does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Create config from defaults plus `SSE_TAP_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Apply `SSE_TAP_*` environment variables on top of this config.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL).filter(|url| !url.trim().is_empty()) {
            self.url = Some(url);
        }

        if let Some(value) = lookup(ENV_METHOD) {
            self.method = value.parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_METHOD,
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup(ENV_CLOSE_ON_DONE) {
            self.close_on_done = parse_flag(&value).ok_or(ConfigError::InvalidEnv {
                name: ENV_CLOSE_ON_DONE,
                value,
            })?;
        }

        Ok(self)
    }
}

/// Parse a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidHeader(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidHeader(raw.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
