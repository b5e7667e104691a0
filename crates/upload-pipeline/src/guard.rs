use crate::uploader::Shared;
use record_model::events::progress::UploadStage;
use std::sync::{Arc, atomic::Ordering};
use tracing::info;

/// RAII guard for the per-instance "upload in progress" flag.
///
/// Dropping it puts the stage back to `Idle` before the flag is cleared, so
/// an observer that sees `is_uploading() == false` also sees `Idle`.
pub(crate) struct UploadGuard {
    shared: Arc<Shared>,
}

impl UploadGuard {
    /// `None` when another run of the same pipeline holds the guard.
    pub(crate) fn acquire(shared: &Arc<Shared>) -> Option<Self> {
        shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        Some(Self {
            shared: Arc::clone(shared),
        })
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        info!("Releasing upload guard.");
        self.shared.stage.send_replace(UploadStage::Idle);
        self.shared.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let shared = Arc::new(Shared::new());

        let guard = UploadGuard::acquire(&shared);
        assert!(guard.is_some());
        assert!(UploadGuard::acquire(&shared).is_none());

        shared.stage.send_replace(UploadStage::Completed);
        drop(guard);

        assert_eq!(*shared.stage.borrow(), UploadStage::Idle);
        assert!(UploadGuard::acquire(&shared).is_some());
    }

    #[test]
    fn instances_do_not_share_the_flag() {
        let sms = Arc::new(Shared::new());
        let contacts = Arc::new(Shared::new());

        let _sms_guard = UploadGuard::acquire(&sms);
        assert!(UploadGuard::acquire(&contacts).is_some());
    }
}
