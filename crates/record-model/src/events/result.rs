use serde::Serialize;
use std::ops::AddAssign;

/// Per-run record counters.
///
/// `skipped` counts records the encoder refused; `sent` and `failed` count only
/// records that were actually put on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadTally {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl UploadTally {
    pub fn total(&self) -> u64 {
        self.sent + self.skipped + self.failed
    }
}

impl AddAssign for UploadTally {
    fn add_assign(&mut self, rhs: Self) {
        self.sent += rhs.sent;
        self.skipped += rhs.skipped;
        self.failed += rhs.failed;
    }
}

/// Terminal outcome of a pipeline invocation.
///
/// A run whose batches all failed is still a `Success` with `failed > 0`.
/// `Failure` is reserved for the reentrancy guard and for errors that abort
/// the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadResult {
    Success { sent: u64, skipped: u64, failed: u64 },
    Failure { reason: String },
}

impl UploadResult {
    pub fn success(sent: u64, skipped: u64, failed: u64) -> Self {
        UploadResult::Success {
            sent,
            skipped,
            failed,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        UploadResult::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadResult::Success { .. })
    }

    /// Some batches were given up on, but the run itself went through.
    pub fn is_partial(&self) -> bool {
        matches!(self, UploadResult::Success { failed, .. } if *failed > 0)
    }
}

impl From<UploadTally> for UploadResult {
    fn from(tally: UploadTally) -> Self {
        UploadResult::success(tally.sent, tally.skipped, tally.failed)
    }
}
