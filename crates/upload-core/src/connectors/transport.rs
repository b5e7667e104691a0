use crate::error::TransportError;
use async_trait::async_trait;
use record_model::records::record::RecordKind;
pub use reqwest::Url;
use std::time::Duration;
use tokio::time::timeout;

/// Base URL of the remote collector. Batch endpoints hang off it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    base_url: Url,
}

impl Destination {
    pub fn parse(base_url: &str) -> Result<Self, TransportError> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: base_url.to_string(),
            reason,
        };

        let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self { base_url: url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST {base}/sms/batch`, `{base}/contacts/batch`, `{base}/call-logs/batch`.
    pub fn batch_endpoint(&self, kind: RecordKind) -> Result<Url, TransportError> {
        self.base_url
            .join(kind.batch_path())
            .map_err(|e| TransportError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

/// One network exchange with the collector. `Ok` means HTTP 200 exactly.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &Url, body: Vec<u8>) -> Result<(), TransportError>;
}

/// Runs one exchange inside a hard time limit, so a transport whose own
/// timeouts misbehave still cannot stall the pipeline.
pub async fn post_bounded(
    transport: &dyn Transport,
    url: &Url,
    body: Vec<u8>,
    limit: Duration,
) -> Result<(), TransportError> {
    match timeout(limit, transport.post_json(url, body)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(limit)),
    }
}
