use crate::{
    connectors::source::{RecordSource, SubStore},
    error::SourceError,
};
use async_trait::async_trait;
use record_model::records::record::Record;
use std::sync::atomic::{AtomicU64, Ordering};

/// A source over records already held in memory, one `Vec` per sub-store.
pub struct MemorySource<R> {
    stores: Vec<SubStore>,
    records: Vec<Vec<R>>,
    pages_fetched: AtomicU64,
    records_fetched: AtomicU64,
}

impl<R: Record> MemorySource<R> {
    pub fn new() -> Self {
        Self {
            stores: Vec::new(),
            records: Vec::new(),
            pages_fetched: AtomicU64::new(0),
            records_fetched: AtomicU64::new(0),
        }
    }

    pub fn with_store(mut self, name: impl Into<String>, records: Vec<R>) -> Self {
        self.stores.push(SubStore::new(name));
        self.records.push(records);
        self
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched.load(Ordering::Relaxed)
    }

    pub fn records_fetched(&self) -> u64 {
        self.records_fetched.load(Ordering::Relaxed)
    }
}

impl<R: Record> Default for MemorySource<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordSource<R> for MemorySource<R> {
    fn sub_stores(&self) -> &[SubStore] {
        &self.stores
    }

    async fn count(&self) -> Result<u64, SourceError> {
        Ok(self.records.iter().map(|r| r.len() as u64).sum())
    }

    async fn fetch_page(
        &self,
        sub_store: usize,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<R>, SourceError> {
        let records = self
            .records
            .get(sub_store)
            .ok_or(SourceError::UnknownSubStore(sub_store))?;

        let page: Vec<R> = records
            .iter()
            .skip(offset as usize)
            .take(limit)
            .cloned()
            .collect();

        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        self.records_fetched
            .fetch_add(page.len() as u64, Ordering::Relaxed);
        Ok(page)
    }
}
