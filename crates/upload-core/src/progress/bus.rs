use record_model::events::progress::Progress;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

/// A subscription handle that can be used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    subscriber_id: u64,
}

/// Fans progress snapshots out to any number of channel subscribers.
#[derive(Clone, Default)]
pub struct ProgressBus {
    subscribers: Arc<RwLock<HashMap<u64, mpsc::Sender<Progress>>>>,
    next_id: Arc<AtomicU64>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, capacity: usize) -> (Subscription, mpsc::Receiver<Progress>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let subscriber_id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.subscribers.write().await.insert(subscriber_id, tx);
        debug!(subscriber_id, "Subscribed to progress");

        (Subscription { subscriber_id }, rx)
    }

    /// Never waits on a subscriber: a full channel drops the event, a closed
    /// one is removed.
    pub async fn publish(&self, progress: &Progress) {
        let mut closed = Vec::new();

        {
            let subscribers = self.subscribers.read().await;
            for (subscriber_id, sender) in subscribers.iter() {
                match sender.try_send(progress.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            subscriber_id,
                            "Dropped progress event for slow subscriber (channel full)"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*subscriber_id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for subscriber_id in closed {
                subscribers.remove(&subscriber_id);
                debug!(subscriber_id, "Removed closed progress subscriber");
            }
        }
    }

    pub async fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers
            .write()
            .await
            .remove(&subscription.subscriber_id);
        debug!(
            subscriber_id = subscription.subscriber_id,
            "Unsubscribed from progress"
        );
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}
