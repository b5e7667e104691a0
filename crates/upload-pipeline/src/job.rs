use crate::{error::UploadError, reporter::Reporter, sender::BatchSender};
use record_model::{
    events::{
        progress::Progress,
        result::{UploadResult, UploadTally},
    },
    records::{batch::FetchChunk, record::Record},
};
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use upload_core::{
    config::{SourceErrorPolicy, UploadConfig},
    connectors::source::RecordSource,
};

/// Live state of one `upload` invocation.
pub(crate) struct UploadJob<R: Record> {
    run_id: String,
    source: Arc<dyn RecordSource<R>>,
    sender: BatchSender,
    config: UploadConfig,
    cancel: CancellationToken,
    reporter: Reporter,
    total: u64,
    tally: UploadTally,
}

impl<R: Record> UploadJob<R> {
    pub(crate) fn new(
        run_id: String,
        source: Arc<dyn RecordSource<R>>,
        sender: BatchSender,
        config: UploadConfig,
        cancel: CancellationToken,
        reporter: Reporter,
    ) -> Self {
        Self {
            run_id,
            source,
            sender,
            config,
            cancel,
            reporter,
            total: 0,
            tally: UploadTally::default(),
        }
    }

    pub(crate) async fn run(mut self) -> Result<UploadResult, UploadError> {
        self.reporter.report(Progress::Counting).await;

        self.total = self.count().await?;
        if self.total == 0 {
            info!(run_id = %self.run_id, kind = %R::KIND, "Nothing to upload");
            self.reporter
                .report(Progress::Completed {
                    total: 0,
                    message: "Nothing to upload".to_string(),
                })
                .await;
            return Ok(UploadResult::success(0, 0, 0));
        }

        info!(run_id = %self.run_id, kind = %R::KIND, total = self.total, "Counted records");
        self.stream().await?;

        let message = if self.cancel.is_cancelled() {
            "Upload cancelled"
        } else {
            "Upload completed"
        };
        info!(
            run_id = %self.run_id,
            kind = %R::KIND,
            sent = self.tally.sent,
            skipped = self.tally.skipped,
            failed = self.tally.failed,
            "{message}"
        );
        self.reporter
            .report(Progress::Completed {
                total: self.total,
                message: message.to_string(),
            })
            .await;

        Ok(self.tally.into())
    }

    /// Record count clamped to `max_safe_count`.
    async fn count(&self) -> Result<u64, UploadError> {
        let counted = match self.source.count().await {
            Ok(counted) => counted,
            Err(e) => match self.config.on_source_error {
                SourceErrorPolicy::StopSilently => {
                    warn!(
                        run_id = %self.run_id,
                        error = %e,
                        "Count failed, treating source as empty"
                    );
                    0
                }
                SourceErrorPolicy::Fail => return Err(e.into()),
            },
        };

        if counted > self.config.max_safe_count {
            warn!(
                counted,
                cap = self.config.max_safe_count,
                "Record count exceeds cap, the rest will not be read"
            );
        }
        Ok(counted.min(self.config.max_safe_count))
    }

    /// Walks the sub-stores in order as one virtual stream, chunk by chunk,
    /// until every sub-store is exhausted, the cap is reached or the run is
    /// cancelled.
    async fn stream(&mut self) -> Result<(), UploadError> {
        let sub_stores = self.source.sub_stores().len();
        let mut consumed = 0u64;

        'stores: for sub_store in 0..sub_stores {
            let mut offset = 0u64;

            loop {
                if self.should_stop(consumed) {
                    break 'stores;
                }

                let remaining = self.total - consumed;
                let limit = remaining.min(self.config.fetch_chunk_size as u64) as usize;
                let mut records = match self.source.fetch_page(sub_store, offset, limit).await {
                    Ok(records) => records,
                    Err(e) => match self.config.on_source_error {
                        SourceErrorPolicy::StopSilently => {
                            warn!(
                                run_id = %self.run_id,
                                sub_store = self.sub_store_name(sub_store),
                                offset,
                                error = %e,
                                "Page fetch failed, treating sub-store as exhausted"
                            );
                            break;
                        }
                        SourceErrorPolicy::Fail => return Err(e.into()),
                    },
                };

                if records.is_empty() {
                    debug!(
                        sub_store = self.sub_store_name(sub_store),
                        offset,
                        "Sub-store exhausted"
                    );
                    break;
                }
                records.truncate(limit);

                let chunk = FetchChunk::new(sub_store, offset, consumed, records);
                let fetched = chunk.len() as u64;
                self.process_chunk(&chunk).await;

                offset += fetched;
                consumed += fetched;

                if self.should_stop(consumed) {
                    break 'stores;
                }
                self.pause(self.config.delay_between_chunks()).await;
            }
        }

        Ok(())
    }

    /// Sends the chunk's batches one after another.
    async fn process_chunk(&mut self, chunk: &FetchChunk<R>) {
        info!(
            run_id = %self.run_id,
            sub_store = self.sub_store_name(chunk.sub_store),
            offset = chunk.offset,
            records = chunk.len(),
            "Processing chunk"
        );

        for batch in chunk.batches(self.config.batch_size) {
            if self.cancel.is_cancelled() {
                info!(
                    run_id = %self.run_id,
                    batch = batch.info.batch,
                    "Cancelled, not starting batch"
                );
                return;
            }

            let delivery = self.sender.deliver(&batch, &self.cancel).await;
            self.tally += delivery.tally();

            self.reporter
                .report(Progress::uploading(self.total, batch.stream_end))
                .await;

            let mut delay = Duration::ZERO;
            if !batch.is_last() {
                delay += self.config.delay_between_batches();
            }
            let every = self.config.throttle_every_batches;
            if every > 0 && batch.info.batch % every == 0 {
                delay += self.config.throttle_delay();
            }
            if !delay.is_zero() {
                self.pause(delay).await;
            }
        }
    }

    fn should_stop(&self, consumed: u64) -> bool {
        consumed >= self.total || self.cancel.is_cancelled()
    }

    /// Sleeps for `delay`, waking early on cancellation.
    async fn pause(&self, delay: Duration) {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            _ = sleep(delay) => {}
        }
    }

    fn sub_store_name(&self, index: usize) -> &str {
        self.source
            .sub_stores()
            .get(index)
            .map(|s| s.name.as_str())
            .unwrap_or("?")
    }
}
