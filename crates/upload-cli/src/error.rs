use thiserror::Error;
use upload_core::error::{ConfigError, TransportError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to load the configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to set up the collector connection: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Upload failed: {0}")]
    Upload(String),
}
