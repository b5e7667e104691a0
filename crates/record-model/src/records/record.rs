use serde::Serialize;
use std::fmt::{self, Debug, Display};
use thiserror::Error;

/// The three record families the collector accepts, one pipeline each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Sms,
    Contacts,
    CallLogs,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Sms => "sms",
            RecordKind::Contacts => "contacts",
            RecordKind::CallLogs => "call-logs",
        }
    }

    /// Path of the batch endpoint, relative to the collector's base URL.
    pub fn batch_path(&self) -> &'static str {
        match self {
            RecordKind::Sms => "sms/batch",
            RecordKind::Contacts => "contacts/batch",
            RecordKind::CallLogs => "call-logs/batch",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a record was left out of a batch payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("record '{id}' has no counterparty address")]
    MissingAddress { id: String },

    #[error("record '{id}' has no phone number")]
    MissingPhoneNumber { id: String },

    #[error("record '{id}' has a negative duration ({duration})")]
    NegativeDuration { id: String, duration: i64 },
}

/// A single item read from the local store.
///
/// Records are immutable once produced by a source. The wire representation is
/// the record's own `Serialize` impl; the encoder adds `device_id` (and
/// `received_at` when [`Record::STAMP_RECEIVED_AT`] is set) around it.
pub trait Record: Serialize + Clone + Debug + Send + Sync + 'static {
    const KIND: RecordKind;

    /// Whether the wire object carries a `received_at` stamp.
    const STAMP_RECEIVED_AT: bool;

    /// Identifier that is stable for the lifetime of the local store.
    fn record_id(&self) -> &str;

    /// Epoch milliseconds; zero when the store does not track one.
    fn timestamp(&self) -> i64;

    /// Rejects records the collector cannot make sense of.
    fn check(&self) -> Result<(), SkipReason>;
}
