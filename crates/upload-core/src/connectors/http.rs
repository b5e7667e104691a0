use crate::{config::UploadConfig, connectors::transport::Transport, error::TransportError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::CONTENT_TYPE};
use tracing::warn;

/// `Transport` over HTTP(S) with reqwest.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &UploadConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &Url, body: Vec<u8>) -> Result<(), TransportError> {
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(url = %url, status = status.as_u16(), "Collector rejected batch");
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(())
    }
}
