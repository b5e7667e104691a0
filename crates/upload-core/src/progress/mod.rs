use record_model::events::progress::Progress;

pub mod bus;

/// Receives progress snapshots from a running pipeline.
///
/// Called inline from the pipeline task, so implementations should hand the
/// value off rather than block.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: &Progress);
}

impl<F> ProgressSink for F
where
    F: Fn(&Progress) + Send + Sync,
{
    fn on_progress(&self, progress: &Progress) {
        self(progress)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _progress: &Progress) {}
}
