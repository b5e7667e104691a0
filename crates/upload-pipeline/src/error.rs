use thiserror::Error;
use upload_core::error::{SourceError, TransportError};

/// Errors that end a run with `UploadResult::Failure`.
///
/// Per-batch transport failures never show up here; they are counted in the
/// result's `failed` field instead.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("already in progress")]
    AlreadyInProgress,

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Invalid destination: {0}")]
    Destination(#[from] TransportError),

    #[error("quick upload failed")]
    QuickUploadFailed,

    #[error("Upload task panicked: {0}")]
    Panicked(String),

    #[error("Upload task did not complete: {0}")]
    Join(String),
}
