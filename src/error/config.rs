//! Configuration loading errors.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading a [`StreamerConfig`](crate::config::StreamerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for the expected shape.
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An environment variable held an unusable value.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },

    /// A header given as `Name: value` could not be split.
    #[error("Invalid header '{0}', expected 'Name: value'")]
    InvalidHeader(String),
}
