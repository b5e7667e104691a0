use serde::Serialize;
use std::fmt;

/// Snapshot emitted while a pipeline runs.
///
/// A run emits at most one `Counting`, then any number of `Processing` with a
/// non-decreasing `processed`, then exactly one of `Completed` or `Failed`.
/// A run rejected by the reentrancy guard emits nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Progress {
    Counting,
    Processing {
        total: u64,
        processed: u64,
        message: String,
    },
    Completed {
        total: u64,
        message: String,
    },
    Failed {
        message: String,
    },
}

impl Progress {
    /// Builds a `Processing` event with the `Uploading: <percent>%` message.
    pub fn uploading(total: u64, processed: u64) -> Self {
        Progress::Processing {
            total,
            processed,
            message: format!("Uploading: {}%", percent(processed, total)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Progress::Completed { .. } | Progress::Failed { .. })
    }

    pub fn stage(&self) -> UploadStage {
        match self {
            Progress::Counting => UploadStage::Counting,
            Progress::Processing { .. } => UploadStage::Processing,
            Progress::Completed { .. } => UploadStage::Completed,
            Progress::Failed { .. } => UploadStage::Failed,
        }
    }
}

/// `floor(processed / total * 100)`; zero when there is nothing to do.
pub fn percent(processed: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    processed.saturating_mul(100) / total
}

/// Where a pipeline instance currently is. `Idle` is re-entered once the
/// reentrancy guard is released, whatever the terminal stage was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UploadStage {
    Idle,
    Counting,
    Processing,
    Completed,
    Failed,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::Idle => "Idle",
            UploadStage::Counting => "Counting",
            UploadStage::Processing => "Processing",
            UploadStage::Completed => "Completed",
            UploadStage::Failed => "Failed",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
