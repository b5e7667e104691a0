use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Failures reading from the local record store.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Sub-store '{sub_store}' unavailable at offset {offset}: {reason}")]
    Unavailable {
        sub_store: String,
        offset: u64,
        reason: String,
    },

    #[error("Failed to count records: {0}")]
    Count(String),

    #[error("Unknown sub-store index {0}")]
    UnknownSubStore(usize),

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of a single network exchange. All of them are retryable.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Send did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Collector answered with HTTP {0}")]
    Status(u16),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid collector URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Error, Debug)]
#[error("Failed to encode batch: {0}")]
pub struct EncodeError(#[from] pub serde_json::Error);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
