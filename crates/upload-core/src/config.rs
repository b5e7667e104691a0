use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// How the delay between failed send attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// `base * attempt`: 500 ms, 1000 ms, ...
    Linear,
    /// `base * 2^(attempt - 1)`, capped by `retry_max_delay_ms`.
    Exponential,
}

/// What a failed page read or count means for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceErrorPolicy {
    /// A failed page ends its sub-store as if it were exhausted; a failed
    /// count counts as zero.
    StopSilently,
    /// Abort the run with a `Failure`.
    Fail,
}

/// Tunables of one upload pipeline. Every field has a default, so a config
/// file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Records per network request
    pub batch_size: usize,

    /// Records pulled from the source per page
    pub fetch_chunk_size: usize,

    /// Records beyond this count are never read
    pub max_safe_count: u64,

    /// Send attempts per batch, first one included
    pub retry_attempts: usize,

    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub backoff: Backoff,

    pub delay_between_batches_ms: u64,
    pub delay_between_chunks_ms: u64,

    /// Every this many batches within a chunk, pause an extra `throttle_delay_ms`
    pub throttle_every_batches: usize,
    pub throttle_delay_ms: u64,

    /// Upper bound on one send attempt, independent of the HTTP client timeouts
    pub send_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,

    /// Default page size for quick uploads
    pub quick_limit: usize,

    pub on_source_error: SourceErrorPolicy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            fetch_chunk_size: 2000,
            max_safe_count: 100_000,
            retry_attempts: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 30_000,
            backoff: Backoff::Linear,
            delay_between_batches_ms: 300,
            delay_between_chunks_ms: 1000,
            throttle_every_batches: 10,
            throttle_delay_ms: 100,
            send_timeout_ms: 10_000,
            connect_timeout_ms: 15_000,
            request_timeout_ms: 15_000,
            quick_limit: 50,
            on_source_error: SourceErrorPolicy::StopSilently,
        }
    }
}

impl UploadConfig {
    /// Reads a TOML file and validates the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: UploadConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("batch_size", self.batch_size as u64),
            ("fetch_chunk_size", self.fetch_chunk_size as u64),
            ("retry_attempts", self.retry_attempts as u64),
            ("send_timeout_ms", self.send_timeout_ms),
            ("quick_limit", self.quick_limit as u64),
        ];

        for (field, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.batch_size > self.fetch_chunk_size {
            return Err(ConfigError::Invalid {
                field: "batch_size",
                reason: format!(
                    "{} exceeds fetch_chunk_size {}",
                    self.batch_size, self.fetch_chunk_size
                ),
            });
        }

        Ok(())
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_fetch_chunk_size(mut self, size: usize) -> Self {
        self.fetch_chunk_size = size;
        self
    }

    pub fn with_max_safe_count(mut self, count: u64) -> Self {
        self.max_safe_count = count;
        self
    }

    pub fn with_source_error_policy(mut self, policy: SourceErrorPolicy) -> Self {
        self.on_source_error = policy;
        self
    }

    pub fn delay_between_batches(&self) -> Duration {
        Duration::from_millis(self.delay_between_batches_ms)
    }

    pub fn delay_between_chunks(&self) -> Duration {
        Duration::from_millis(self.delay_between_chunks_ms)
    }

    pub fn throttle_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_delay_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
