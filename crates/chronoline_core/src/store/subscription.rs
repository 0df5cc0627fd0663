//! Snapshot subscriptions with cancellable handles.
//!
//! # Invariants
//! - Each subscriber receives snapshots in publish order.
//! - Cancelling removes the listener; the handle then reports closed.
//! - Subscribers whose handle was dropped are pruned on the next publish.

use crate::model::timeline::TimelineDocument;
use crate::store::{StoreError, StoreResult};
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

struct Listener {
    path: String,
    sender: Sender<TimelineDocument>,
}

/// Listener table shared between a store and the handles it issued.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener>>,
}

impl SubscriberRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a listener for `path`, optionally seeding it with the
    /// current snapshot.
    pub fn register(
        self: &Arc<Self>,
        path: &str,
        current: Option<TimelineDocument>,
    ) -> StoreResult<Subscription> {
        let (sender, receiver) = channel();
        if let Some(snapshot) = current {
            let _ = sender.send(snapshot);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(
                id,
                Listener {
                    path: path.to_string(),
                    sender,
                },
            );
        debug!("event=subscribe module=store status=ok subscription_id={id}");

        Ok(Subscription {
            receiver,
            canceller: SubscriptionCanceller {
                id,
                registry: Arc::downgrade(self),
            },
        })
    }

    /// Sends `snapshot` to every live listener on `path`.
    pub fn publish(&self, path: &str, snapshot: &TimelineDocument) -> StoreResult<usize> {
        let mut listeners = self.listeners.lock().map_err(|_| StoreError::Poisoned)?;
        let mut delivered = 0;
        listeners.retain(|_, listener| {
            if listener.path != path {
                return true;
            }
            let alive = listener.sender.send(snapshot.clone()).is_ok();
            if alive {
                delivered += 1;
            }
            alive
        });
        Ok(delivered)
    }

    /// Drops every listener on `path`, closing their feeds.
    pub fn close_path(&self, path: &str) -> StoreResult<()> {
        let mut listeners = self.listeners.lock().map_err(|_| StoreError::Poisoned)?;
        listeners.retain(|_, listener| listener.path != path);
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|map| map.len()).unwrap_or(0)
    }

    fn contains(&self, id: u64) -> bool {
        self.listeners
            .lock()
            .map(|map| map.contains_key(&id))
            .unwrap_or(false)
    }

    fn remove(&self, id: u64) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.remove(&id);
        }
    }
}

/// Detached cancel capability for one subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionCanceller {
    id: u64,
    registry: Weak<SubscriberRegistry>,
}

impl SubscriptionCanceller {
    /// Removes the listener. Idempotent.
    pub fn cancel(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            debug!(
                "event=unsubscribe module=store status=ok subscription_id={}",
                self.id
            );
        }
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }
}

/// Feed of full timeline snapshots for one document.
///
/// Dropping the handle cancels the subscription.
pub struct Subscription {
    receiver: Receiver<TimelineDocument>,
    canceller: SubscriptionCanceller,
}

impl Subscription {
    /// Next queued snapshot, without blocking.
    pub fn try_next(&self) -> Option<TimelineDocument> {
        match self.receiver.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for the next snapshot.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<TimelineDocument> {
        match self.receiver.recv_timeout(timeout) {
            Ok(snapshot) => Some(snapshot),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// All queued snapshots, oldest first.
    pub fn drain(&self) -> Vec<TimelineDocument> {
        self.receiver.try_iter().collect()
    }

    /// Most recent queued snapshot, discarding older ones.
    pub fn latest(&self) -> Option<TimelineDocument> {
        self.receiver.try_iter().last()
    }

    pub fn canceller(&self) -> SubscriptionCanceller {
        self.canceller.clone()
    }

    /// Stops delivery. Snapshots already queued stay readable.
    pub fn unsubscribe(&self) {
        self.canceller.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.canceller.cancel();
    }
}
