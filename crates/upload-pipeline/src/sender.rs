use record_model::{
    events::result::UploadTally,
    records::{batch::SendBatch, record::Record},
};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use upload_core::{
    connectors::transport::{Transport, Url, post_bounded},
    encoder::BatchEncoder,
    error::TransportError,
    metrics::UploadMetrics,
    retry::{RetryError, RetryPolicy},
};

/// What became of one `SendBatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Acknowledged with HTTP 200.
    Sent { records: usize, skipped: usize },
    /// Given up on after retries, cancellation or an encoding error.
    Failed { records: usize, skipped: usize },
    /// Every record was filtered out; nothing went on the wire.
    Skipped { records: usize },
}

impl Delivery {
    pub fn tally(&self) -> UploadTally {
        match *self {
            Delivery::Sent { records, skipped } => UploadTally {
                sent: records as u64,
                skipped: skipped as u64,
                failed: 0,
            },
            Delivery::Failed { records, skipped } => UploadTally {
                sent: 0,
                skipped: skipped as u64,
                failed: records as u64,
            },
            Delivery::Skipped { records } => UploadTally {
                sent: 0,
                skipped: records as u64,
                failed: 0,
            },
        }
    }
}

/// Delivers batches of one record kind to one endpoint.
///
/// Nothing returned from here is an error: every transport or encoding problem
/// ends up as a `false` or a [`Delivery::Failed`].
pub struct BatchSender {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    encoder: BatchEncoder,
    retry: RetryPolicy,
    send_timeout: Duration,
    metrics: UploadMetrics,
}

impl BatchSender {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: Url,
        encoder: BatchEncoder,
        retry: RetryPolicy,
        send_timeout: Duration,
        metrics: UploadMetrics,
    ) -> Self {
        Self {
            transport,
            endpoint,
            encoder,
            retry,
            send_timeout,
            metrics,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn encoder(&self) -> &BatchEncoder {
        &self.encoder
    }

    /// A single bounded attempt.
    pub async fn send(&self, body: Vec<u8>) -> bool {
        match self.attempt(body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "Send failed");
                false
            }
        }
    }

    /// Sends `body` under the retry policy. Returns `false` once attempts run
    /// out or `cancel` fires between attempts.
    pub async fn send_with_retry(&self, body: &[u8], cancel: &CancellationToken) -> bool {
        self.send_with_retry_logged(body, cancel, "-").await
    }

    /// Encodes `batch`, then hands it to [`Self::send_with_retry`].
    pub async fn deliver<R: Record>(
        &self,
        batch: &SendBatch<'_, R>,
        cancel: &CancellationToken,
    ) -> Delivery {
        let encoded = match self.encoder.encode(batch.records, batch.info) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(
                    batch_id = %batch.id,
                    batch = batch.info.batch,
                    of = batch.info.of,
                    error = %e,
                    "Failed to encode batch"
                );
                self.metrics.record_failed(batch.len() as u64);
                return Delivery::Failed {
                    records: batch.len(),
                    skipped: 0,
                };
            }
        };

        if encoded.skipped > 0 {
            self.metrics.increment_skipped(encoded.skipped as u64);
        }

        if encoded.is_empty() {
            debug!(batch_id = %batch.id, records = batch.len(), "Every record skipped");
            return Delivery::Skipped {
                records: encoded.skipped,
            };
        }

        let records = encoded.encoded;
        let skipped = encoded.skipped;

        if self
            .send_with_retry_logged(&encoded.body, cancel, &batch.id)
            .await
        {
            self.metrics.record_sent(records as u64);
            debug!(
                batch_id = %batch.id,
                batch = batch.info.batch,
                of = batch.info.of,
                records,
                "Batch sent"
            );
            Delivery::Sent { records, skipped }
        } else {
            self.metrics.record_failed(records as u64);
            Delivery::Failed { records, skipped }
        }
    }

    async fn send_with_retry_logged(
        &self,
        body: &[u8],
        cancel: &CancellationToken,
        batch_id: &str,
    ) -> bool {
        let result = self
            .retry
            .run(cancel, |attempt| async move {
                if attempt > 1 {
                    self.metrics.increment_retries(1);
                }
                let result = self.attempt(body.to_vec()).await;
                if let Err(e) = &result {
                    warn!(batch_id, attempt, error = %e, "Send attempt failed");
                }
                result
            })
            .await;

        match result {
            Ok(()) => true,
            Err(RetryError::Cancelled { attempts, .. }) => {
                warn!(batch_id, attempts, "Retries abandoned, upload cancelled");
                false
            }
            Err(RetryError::AttemptsExceeded { attempts, last }) => {
                error!(batch_id, attempts, error = %last, "Batch failed permanently");
                false
            }
        }
    }

    async fn attempt(&self, body: Vec<u8>) -> Result<(), TransportError> {
        post_bounded(
            self.transport.as_ref(),
            &self.endpoint,
            body,
            self.send_timeout,
        )
        .await
    }
}
