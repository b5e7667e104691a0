use crate::uploader::BatchUploader;
use async_trait::async_trait;
use record_model::{
    events::progress::Progress,
    records::{
        contact::ContactRecord,
        record::{Record, RecordKind, SkipReason},
        sms::SmsRecord,
    },
};
use serde::{Serialize, Serializer, ser::Error as _};
use serde_json::Value;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::time::{Instant, sleep};
use upload_core::{
    config::UploadConfig,
    connectors::{
        memory::MemorySource,
        source::{RecordSource, SubStore},
        transport::{Destination, Transport, Url},
    },
    error::{SourceError, TransportError},
    progress::ProgressSink,
};

pub(crate) const DEVICE_ID: &str = "device-7";
const BASE_TS: i64 = 1_700_000_000_000;

pub(crate) fn destination() -> Destination {
    Destination::parse("http://collector.test/api").unwrap()
}

pub(crate) fn uploader<R: Record>(transport: &Arc<ScriptedTransport>) -> BatchUploader<R> {
    uploader_with(transport, UploadConfig::default())
}

pub(crate) fn uploader_with<R: Record>(
    transport: &Arc<ScriptedTransport>,
    config: UploadConfig,
) -> BatchUploader<R> {
    BatchUploader::new(transport.clone(), config)
}

pub(crate) fn contacts(n: usize) -> Vec<ContactRecord> {
    (0..n)
        .map(|i| {
            ContactRecord::new(
                format!("c{i}"),
                format!("Contact {i}"),
                format!("+1555{i:06}"),
            )
        })
        .collect()
}

pub(crate) fn inbox(n: usize) -> Vec<SmsRecord> {
    (0..n)
        .map(|i| SmsRecord::inbox(format!("in{i}"), "+15550001", "hello", BASE_TS - i as i64))
        .collect()
}

pub(crate) fn sent(n: usize) -> Vec<SmsRecord> {
    (0..n)
        .map(|i| SmsRecord::sent(format!("out{i}"), "+15550002", "hi", BASE_TS - i as i64))
        .collect()
}

pub(crate) fn contact_source(n: usize) -> Arc<MemorySource<ContactRecord>> {
    Arc::new(MemorySource::new().with_store("contacts", contacts(n)))
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub url: Url,
    pub body: Vec<u8>,
    pub at: Instant,
}

impl Call {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn data_len(&self) -> usize {
        self.json()["data"].as_array().unwrap().len()
    }
}

type Script = Box<dyn Fn(usize) -> Result<(), TransportError> + Send + Sync>;

/// Records every exchange and answers according to a script keyed by the
/// 0-based call index.
pub(crate) struct ScriptedTransport {
    script: Script,
    latency: Duration,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new(
        script: impl Fn(usize) -> Result<(), TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn ok() -> Arc<Self> {
        Arc::new(Self::new(|_| Ok(())))
    }

    pub fn status(code: u16) -> Arc<Self> {
        Arc::new(Self::new(move |_| Err(TransportError::Status(code))))
    }

    /// Succeeds every call after `latency`.
    pub fn slow(latency: Duration) -> Arc<Self> {
        Arc::new(Self::new(|_| Ok(())).with_latency(latency))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Time between the starts of consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        self.calls()
            .windows(2)
            .map(|pair| pair[1].at - pair[0].at)
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, url: &Url, body: Vec<u8>) -> Result<(), TransportError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                url: url.clone(),
                body,
                at: Instant::now(),
            });
            calls.len() - 1
        };

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        (self.script)(index)
    }
}

/// Collects every progress event it is handed.
#[derive(Default)]
pub(crate) struct Collector {
    events: Mutex<Vec<Progress>>,
}

impl Collector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Progress> {
        self.events.lock().unwrap().clone()
    }

    pub fn processed(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|p| match p {
                Progress::Processing { processed, .. } => Some(processed),
                _ => None,
            })
            .collect()
    }

    pub fn terminal_count(&self) -> usize {
        self.events().iter().filter(|p| p.is_terminal()).count()
    }
}

impl ProgressSink for Collector {
    fn on_progress(&self, progress: &Progress) {
        self.events.lock().unwrap().push(progress.clone());
    }
}

/// Wraps a [`MemorySource`], counting calls and failing where told to.
pub(crate) struct ProbeSource<R> {
    inner: MemorySource<R>,
    fail_count: bool,
    fail_fetch_at: Option<(usize, u64)>,
    count_calls: AtomicU64,
    fetch_calls: AtomicU64,
}

impl<R: Record> ProbeSource<R> {
    pub fn new(inner: MemorySource<R>) -> Self {
        Self {
            inner,
            fail_count: false,
            fail_fetch_at: None,
            count_calls: AtomicU64::new(0),
            fetch_calls: AtomicU64::new(0),
        }
    }

    pub fn failing_count(mut self) -> Self {
        self.fail_count = true;
        self
    }

    pub fn failing_fetch_at(mut self, sub_store: usize, offset: u64) -> Self {
        self.fail_fetch_at = Some((sub_store, offset));
        self
    }

    pub fn count_calls(&self) -> u64 {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: Record> RecordSource<R> for ProbeSource<R> {
    fn sub_stores(&self) -> &[SubStore] {
        self.inner.sub_stores()
    }

    async fn count(&self) -> Result<u64, SourceError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_count {
            return Err(SourceError::Count("database locked".to_string()));
        }
        self.inner.count().await
    }

    async fn fetch_page(
        &self,
        sub_store: usize,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<R>, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch_at == Some((sub_store, offset)) {
            return Err(SourceError::Unavailable {
                sub_store: self.inner.sub_stores()[sub_store].name.clone(),
                offset,
                reason: "cursor closed".to_string(),
            });
        }
        self.inner.fetch_page(sub_store, offset, limit).await
    }
}

/// Claims ten records, then blows up on the first read.
pub(crate) struct PanickingSource {
    stores: Vec<SubStore>,
}

impl PanickingSource {
    pub fn new() -> Self {
        Self {
            stores: vec![SubStore::new("contacts")],
        }
    }
}

#[async_trait]
impl RecordSource<ContactRecord> for PanickingSource {
    fn sub_stores(&self) -> &[SubStore] {
        &self.stores
    }

    async fn count(&self) -> Result<u64, SourceError> {
        Ok(10)
    }

    async fn fetch_page(
        &self,
        _sub_store: usize,
        _offset: u64,
        _limit: usize,
    ) -> Result<Vec<ContactRecord>, SourceError> {
        panic!("source exploded");
    }
}

/// A record that passes validation but cannot be serialized.
#[derive(Debug, Clone)]
pub(crate) struct Poison(pub String);

impl Serialize for Poison {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("unserializable field"))
    }
}

impl Record for Poison {
    const KIND: RecordKind = RecordKind::Contacts;
    const STAMP_RECEIVED_AT: bool = false;

    fn record_id(&self) -> &str {
        &self.0
    }

    fn timestamp(&self) -> i64 {
        0
    }

    fn check(&self) -> Result<(), SkipReason> {
        Ok(())
    }
}
