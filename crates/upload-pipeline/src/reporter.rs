use crate::uploader::Shared;
use record_model::events::progress::Progress;
use std::sync::Arc;
use upload_core::progress::ProgressSink;

/// Fans one run's progress out to the caller's sink, the instance's bus and
/// the stage watch.
#[derive(Clone)]
pub(crate) struct Reporter {
    shared: Arc<Shared>,
    sink: Arc<dyn ProgressSink>,
}

impl Reporter {
    pub(crate) fn new(shared: Arc<Shared>, sink: Arc<dyn ProgressSink>) -> Self {
        Self { shared, sink }
    }

    pub(crate) async fn report(&self, progress: Progress) {
        self.shared.stage.send_replace(progress.stage());
        self.notify(&progress).await;
    }

    /// Like [`Self::report`] but leaves the stage alone; used once the guard
    /// has already been released.
    pub(crate) async fn notify(&self, progress: &Progress) {
        self.sink.on_progress(progress);
        self.shared.bus.publish(progress).await;
    }
}
