use crate::error::EncodeError;
use chrono::{SecondsFormat, Utc};
use record_model::records::{batch::BatchInfo, record::Record};
use serde::Serialize;
use tracing::debug;

/// Request body accepted by the collector's batch endpoints.
#[derive(Serialize)]
struct Envelope<'a, R: Record> {
    device_id: &'a str,
    data: Vec<WireRecord<'a, R>>,
    batch_info: BatchInfo,
}

#[derive(Serialize)]
struct WireRecord<'a, R: Record> {
    #[serde(flatten)]
    record: &'a R,
    device_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    received_at: Option<&'a str>,
}

/// A batch ready for the wire.
#[derive(Debug, Clone)]
pub struct EncodedBatch {
    pub body: Vec<u8>,
    /// Records present in `body`.
    pub encoded: usize,
    /// Records that failed [`Record::check`] and were left out.
    pub skipped: usize,
}

impl EncodedBatch {
    /// Nothing survived filtering; there is no point in sending.
    pub fn is_empty(&self) -> bool {
        self.encoded == 0
    }
}

/// Maps a slice of records plus its position into the JSON payload
/// `{"device_id", "data": [...], "batch_info": {"batch", "of"}}`.
#[derive(Debug, Clone)]
pub struct BatchEncoder {
    device_id: String,
}

impl BatchEncoder {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn encode<R: Record>(
        &self,
        records: &[R],
        info: BatchInfo,
    ) -> Result<EncodedBatch, EncodeError> {
        let received_at = R::STAMP_RECEIVED_AT
            .then(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        let mut skipped = 0;
        let data: Vec<_> = records
            .iter()
            .filter(|record| match record.check() {
                Ok(()) => true,
                Err(reason) => {
                    debug!(kind = %R::KIND, reason = %reason, "Skipping record");
                    skipped += 1;
                    false
                }
            })
            .map(|record| WireRecord {
                record,
                device_id: &self.device_id,
                received_at: received_at.as_deref(),
            })
            .collect();

        let encoded = data.len();
        let body = serde_json::to_vec(&Envelope {
            device_id: &self.device_id,
            data,
            batch_info: info,
        })?;

        Ok(EncodedBatch {
            body,
            encoded,
            skipped,
        })
    }
}
