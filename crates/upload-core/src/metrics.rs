use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    runs_started: AtomicU64,
    records_sent: AtomicU64,
    records_skipped: AtomicU64,
    records_failed: AtomicU64,
    batches_sent: AtomicU64,
    batches_failed: AtomicU64,
    retry_count: AtomicU64,
}

/// Counters accumulated over every run of one pipeline instance.
#[derive(Debug, Clone)]
pub struct UploadMetrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub runs_started: u64,
    pub records_sent: u64,
    pub records_skipped: u64,
    pub records_failed: u64,
    pub batches_sent: u64,
    pub batches_failed: u64,
    pub retry_count: u64,
}

impl UploadMetrics {
    pub fn new() -> Self {
        UploadMetrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_runs(&self) {
        self.inner.runs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self, records: u64) {
        self.inner.records_sent.fetch_add(records, Ordering::Relaxed);
        self.inner.batches_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self, records: u64) {
        self.inner
            .records_failed
            .fetch_add(records, Ordering::Relaxed);
        self.inner.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self, records: u64) {
        self.inner
            .records_skipped
            .fetch_add(records, Ordering::Relaxed);
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retry_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs_started: self.inner.runs_started.load(Ordering::Relaxed),
            records_sent: self.inner.records_sent.load(Ordering::Relaxed),
            records_skipped: self.inner.records_skipped.load(Ordering::Relaxed),
            records_failed: self.inner.records_failed.load(Ordering::Relaxed),
            batches_sent: self.inner.batches_sent.load(Ordering::Relaxed),
            batches_failed: self.inner.batches_failed.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for UploadMetrics {
    fn default() -> Self {
        Self::new()
    }
}
