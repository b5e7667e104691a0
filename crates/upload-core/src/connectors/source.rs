use crate::error::SourceError;
use async_trait::async_trait;
use record_model::records::record::Record;

/// One ordered logical store behind a source, e.g. "inbox" or "sent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubStore {
    pub name: String,
}

impl SubStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Paginated, read-only access to the local record store.
///
/// Sub-stores are reported in priority order; the pipeline drains them in that
/// order as one virtual stream. Records inside a page are newest first.
#[async_trait]
pub trait RecordSource<R: Record>: Send + Sync {
    fn sub_stores(&self) -> &[SubStore];

    /// Total across every sub-store.
    async fn count(&self) -> Result<u64, SourceError>;

    /// Up to `limit` records of `sub_store` starting at `offset`.
    /// An empty page means the sub-store is exhausted.
    async fn fetch_page(
        &self,
        sub_store: usize,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<R>, SourceError>;
}
