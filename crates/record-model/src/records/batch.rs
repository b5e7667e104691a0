use super::record::{Record, RecordKind};
use serde::Serialize;

/// Position of a batch inside its chunk, as sent in `batch_info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchInfo {
    pub batch: usize,
    pub of: usize,
}

/// Number of batches needed to carry `records` records.
pub fn batch_count(records: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    records.div_ceil(batch_size)
}

/// A page of records pulled from one sub-store.
#[derive(Debug, Clone)]
pub struct FetchChunk<R> {
    pub sub_store: usize,
    /// Offset of the first record within its sub-store.
    pub offset: u64,
    /// Offset of the first record within the virtual stream of all sub-stores.
    pub stream_offset: u64,
    pub records: Vec<R>,
}

/// A contiguous slice of a chunk; the unit of network transmission.
#[derive(Debug, Clone)]
pub struct SendBatch<'a, R> {
    pub id: String,
    pub info: BatchInfo,
    pub records: &'a [R],
    /// Virtual-stream position just past this batch's last record.
    pub stream_end: u64,
}

impl<R: Record> FetchChunk<R> {
    pub fn new(sub_store: usize, offset: u64, stream_offset: u64, records: Vec<R>) -> Self {
        Self {
            sub_store,
            offset,
            stream_offset,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Splits the chunk into batches of at most `batch_size`, in offset order.
    pub fn batches(&self, batch_size: usize) -> impl Iterator<Item = SendBatch<'_, R>> + '_ {
        let of = batch_count(self.records.len(), batch_size);

        self.records
            .chunks(batch_size.max(1))
            .enumerate()
            .scan(0usize, move |end, (index, records)| {
                *end += records.len();
                let number = index + 1;
                Some(SendBatch {
                    id: batch_id(R::KIND, self.sub_store, self.offset, number),
                    info: BatchInfo { batch: number, of },
                    records,
                    stream_end: self.stream_offset + *end as u64,
                })
            })
    }
}

impl<R> SendBatch<'_, R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_last(&self) -> bool {
        self.info.batch == self.info.of
    }
}

fn batch_id(kind: RecordKind, sub_store: usize, offset: u64, number: usize) -> String {
    let mut h = blake3::Hasher::new();
    h.update(kind.as_str().as_bytes());
    h.update(&(sub_store as u64).to_le_bytes());
    h.update(&offset.to_le_bytes());
    h.update(&(number as u64).to_le_bytes());
    let hex = h.finalize().to_hex();
    hex.as_str()[..16].to_string()
}
