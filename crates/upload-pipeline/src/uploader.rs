use crate::{
    error::UploadError, guard::UploadGuard, job::UploadJob, reporter::Reporter,
    sender::BatchSender,
};
use record_model::{
    events::{
        progress::{Progress, UploadStage},
        result::UploadResult,
    },
    records::{batch::BatchInfo, record::Record},
};
use std::{
    any::Any,
    marker::PhantomData,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use upload_core::{
    config::{SourceErrorPolicy, UploadConfig},
    connectors::{
        source::RecordSource,
        transport::{Destination, Transport, Url},
    },
    encoder::BatchEncoder,
    metrics::{MetricsSnapshot, UploadMetrics},
    progress::{
        ProgressSink,
        bus::{ProgressBus, Subscription},
    },
    retry::RetryPolicy,
};
use uuid::Uuid;

const SUBSCRIBER_CAPACITY: usize = 64;

/// State shared by every invocation of one pipeline instance.
pub(crate) struct Shared {
    pub(crate) running: AtomicBool,
    pub(crate) cancel: Mutex<CancellationToken>,
    pub(crate) stage: watch::Sender<UploadStage>,
    pub(crate) bus: ProgressBus,
    pub(crate) metrics: UploadMetrics,
}

impl Shared {
    pub(crate) fn new() -> Self {
        let (stage, _) = watch::channel(UploadStage::Idle);
        Self {
            running: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
            stage,
            bus: ProgressBus::new(),
            metrics: UploadMetrics::new(),
        }
    }

    /// Installs a fresh token so a `cancel()` from an earlier run does not
    /// leak into this one.
    fn reset_cancel(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        token
    }

    fn cancel(&self) {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

/// Requests cancellation of a pipeline from another task.
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<Shared>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        info!("Upload cancellation requested.");
        self.shared.cancel();
    }
}

/// Uploads every record of one kind from a [`RecordSource`] to the collector.
///
/// One instance is one pipeline: at most one `upload` runs on it at a time,
/// while separate instances (say SMS and contacts) run independently. Clones
/// share the same guard, cancellation, progress bus and metrics.
pub struct BatchUploader<R: Record> {
    shared: Arc<Shared>,
    transport: Arc<dyn Transport>,
    config: UploadConfig,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for BatchUploader<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R: Record> BatchUploader<R> {
    pub fn new(transport: Arc<dyn Transport>, config: UploadConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            transport,
            config,
            _marker: PhantomData,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Runs the full pipeline: count, then fetch and send every record in
    /// chunks and batches.
    ///
    /// Returns `Failure("already in progress")` without touching the source
    /// when another run of this instance is active. Batches that could not be
    /// delivered are reported in `failed`; they never turn the result into a
    /// `Failure`.
    pub async fn upload(
        &self,
        source: Arc<dyn RecordSource<R>>,
        device_id: &str,
        destination: &Destination,
        on_progress: Arc<dyn ProgressSink>,
    ) -> UploadResult {
        let Some(guard) = UploadGuard::acquire(&self.shared) else {
            warn!(kind = %R::KIND, "Upload already in progress");
            return UploadResult::failure(UploadError::AlreadyInProgress.to_string());
        };

        let cancel = self.shared.reset_cancel();
        self.shared.metrics.increment_runs();
        let run_id = Uuid::new_v4().to_string();
        let reporter = Reporter::new(Arc::clone(&self.shared), on_progress);

        let endpoint = match destination.batch_endpoint(R::KIND) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                let err = UploadError::from(e);
                error!(run_id = %run_id, error = %err, "Upload failed");
                reporter.report(failed_progress(&err)).await;
                return UploadResult::failure(err.to_string());
            }
        };

        info!(run_id = %run_id, kind = %R::KIND, endpoint = %endpoint, "Upload started");
        let job = UploadJob::new(
            run_id.clone(),
            source,
            self.sender(endpoint, device_id),
            self.config.clone(),
            cancel,
            reporter.clone(),
        );

        let task_reporter = reporter.clone();
        let task_run_id = run_id.clone();
        // The guard lives in the task, so it is held until the run actually
        // ends even if the caller stops polling this future.
        let task = tokio::spawn(async move {
            let _guard = guard;
            match job.run().await {
                Ok(result) => result,
                Err(err) => {
                    error!(run_id = %task_run_id, error = %err, "Upload failed");
                    task_reporter.report(failed_progress(&err)).await;
                    UploadResult::failure(err.to_string())
                }
            }
        });

        match task.await {
            Ok(result) => result,
            Err(join_err) => {
                let err = if join_err.is_panic() {
                    UploadError::Panicked(panic_message(join_err.into_panic()))
                } else {
                    UploadError::Join(join_err.to_string())
                };
                error!(run_id = %run_id, error = %err, "Upload task aborted");
                reporter.notify(&failed_progress(&err)).await;
                UploadResult::failure(err.to_string())
            }
        }
    }

    /// Sends at most `limit` records (default `quick_limit`) from the first
    /// sub-store as a single batch: one bounded attempt, no chunking, no
    /// retries. Does not take the reentrancy guard and emits no progress.
    pub async fn upload_quick(
        &self,
        source: Arc<dyn RecordSource<R>>,
        device_id: &str,
        destination: &Destination,
        limit: Option<usize>,
    ) -> UploadResult {
        let limit = limit.unwrap_or(self.config.quick_limit);

        match self
            .quick(source.as_ref(), device_id, destination, limit)
            .await
        {
            Ok(result) => result,
            Err(err) => {
                warn!(kind = %R::KIND, error = %err, "Quick upload failed");
                UploadResult::failure(err.to_string())
            }
        }
    }

    async fn quick(
        &self,
        source: &dyn RecordSource<R>,
        device_id: &str,
        destination: &Destination,
        limit: usize,
    ) -> Result<UploadResult, UploadError> {
        let endpoint = destination.batch_endpoint(R::KIND)?;
        if source.sub_stores().is_empty() || limit == 0 {
            return Ok(UploadResult::success(0, 0, 0));
        }

        let mut records = match source.fetch_page(0, 0, limit).await {
            Ok(records) => records,
            Err(e) => match self.config.on_source_error {
                SourceErrorPolicy::StopSilently => {
                    warn!(error = %e, "Quick upload page fetch failed, nothing to send");
                    Vec::new()
                }
                SourceErrorPolicy::Fail => return Err(e.into()),
            },
        };
        records.truncate(limit);
        if records.is_empty() {
            return Ok(UploadResult::success(0, 0, 0));
        }

        let sender = self.sender(endpoint, device_id);
        let encoded = sender
            .encoder()
            .encode(&records, BatchInfo { batch: 1, of: 1 })
            .map_err(|e| {
                error!(error = %e, "Failed to encode quick upload batch");
                self.shared.metrics.record_failed(records.len() as u64);
                UploadError::QuickUploadFailed
            })?;

        let skipped = encoded.skipped as u64;
        if skipped > 0 {
            self.shared.metrics.increment_skipped(skipped);
        }
        if encoded.is_empty() {
            return Ok(UploadResult::success(0, skipped, 0));
        }

        let sent = encoded.encoded as u64;
        if sender.send(encoded.body).await {
            self.shared.metrics.record_sent(sent);
            info!(kind = %R::KIND, sent, skipped, "Quick upload sent");
            Ok(UploadResult::success(sent, skipped, 0))
        } else {
            self.shared.metrics.record_failed(sent);
            Err(UploadError::QuickUploadFailed)
        }
    }

    /// Asks the running upload, if any, to stop before its next unit of work.
    pub fn cancel(&self) {
        info!(kind = %R::KIND, "Upload cancellation requested.");
        self.shared.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Subscribes to progress of every subsequent run on this instance.
    pub async fn subscribe(&self) -> (Subscription, mpsc::Receiver<Progress>) {
        self.shared.bus.subscribe(SUBSCRIBER_CAPACITY).await
    }

    pub async fn unsubscribe(&self, subscription: Subscription) {
        self.shared.bus.unsubscribe(subscription).await;
    }

    pub fn stage(&self) -> UploadStage {
        *self.shared.stage.borrow()
    }

    pub fn watch_stage(&self) -> watch::Receiver<UploadStage> {
        self.shared.stage.subscribe()
    }

    pub fn is_uploading(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    fn sender(&self, endpoint: Url, device_id: &str) -> BatchSender {
        BatchSender::new(
            Arc::clone(&self.transport),
            endpoint,
            BatchEncoder::new(device_id),
            RetryPolicy::from_config(&self.config),
            self.config.send_timeout(),
            self.shared.metrics.clone(),
        )
    }
}

fn failed_progress(err: &UploadError) -> Progress {
    Progress::Failed {
        message: format!("Upload failed: {err}"),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
