//! In-memory [`DocumentMirror`] used by tests and local development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::{Notify, mpsc};

use super::{DocumentMirror, MirrorError, Subscription};

/// An in-memory document mirror.
///
/// Behaves like the real backend from the stores' point of view: documents
/// are keyed by path, every overwrite notifies live subscribers (including
/// the writer's own subscription, echoing the write back), and a
/// subscription's first snapshot is the current document state.
///
/// Test hooks: [`document`](Self::document) and
/// [`write_count`](Self::write_count) observe the "persisted" state, and
/// [`push_remote`](Self::push_remote) simulates a change arriving from
/// another device without counting as a local write.
#[derive(Clone, Default)]
pub struct MemoryMirror {
    inner: Arc<MemoryMirrorInner>,
}

#[derive(Default)]
struct MemoryMirrorInner {
    state: Mutex<HashMap<String, PathState>>,
    write_activity: Notify,
}

#[derive(Default)]
struct PathState {
    value: Option<Value>,
    writes: u64,
    subscribers: Vec<mpsc::Sender<Option<Value>>>,
}

impl MemoryMirror {
    /// Create an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document value at `path`, if any.
    #[must_use]
    pub fn document(&self, path: &str) -> Option<Value> {
        self.state().get(path).and_then(|s| s.value.clone())
    }

    /// Number of overwrites received for `path`.
    #[must_use]
    pub fn write_count(&self, path: &str) -> u64 {
        self.state().get(path).map_or(0, |s| s.writes)
    }

    /// Simulate a change from another device: set the document and notify
    /// subscribers without incrementing the write count.
    pub fn push_remote(&self, path: &str, value: Value) {
        let mut state = self.state();
        let entry = state.entry(path.to_string()).or_default();
        entry.value = Some(value.clone());
        notify_subscribers(entry, Some(value));
    }

    /// Wait until at least `count` overwrites have landed on `path`.
    ///
    /// Mirror writes are fire-and-forget from the stores' side, so tests
    /// use this to rendezvous with the spawned write task. Pair with
    /// `tokio::time::timeout` to bound the wait.
    pub async fn wait_for_writes(&self, path: &str, count: u64) {
        loop {
            let notified = self.inner.write_activity.notified();
            if self.write_count(path) >= count {
                return;
            }
            notified.await;
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, HashMap<String, PathState>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentMirror for MemoryMirror {
    fn subscribe(&self, path: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(8);

        let mut state = self.state();
        let entry = state.entry(path.to_string()).or_default();
        // Initial snapshot of the current state, as the backend delivers
        let _ = tx.try_send(entry.value.clone());
        entry.subscribers.push(tx);

        Subscription::new(rx)
    }

    async fn overwrite(&self, path: &str, fields: Value) -> Result<(), MirrorError> {
        {
            let mut state = self.state();
            let entry = state.entry(path.to_string()).or_default();
            entry.value = Some(fields.clone());
            entry.writes += 1;
            notify_subscribers(entry, Some(fields));
        }
        self.inner.write_activity.notify_waiters();
        Ok(())
    }
}

/// Fan a snapshot out to live subscribers, pruning closed ones.
fn notify_subscribers(entry: &mut PathState, snapshot: Option<Value>) {
    entry.subscribers.retain(|tx| {
        !matches!(
            tx.try_send(snapshot.clone()),
            Err(mpsc::error::TrySendError::Closed(_))
        )
    });
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_subscription_gets_initial_and_updated_snapshots() {
        let mirror = MemoryMirror::new();
        let mut sub = mirror.subscribe("users/u1/cart/main");

        // Initial snapshot of a missing document
        assert_eq!(sub.next().await, Some(None));

        mirror
            .overwrite("users/u1/cart/main", json!({ "items": [1] }))
            .await
            .expect("overwrite");
        assert_eq!(sub.next().await, Some(Some(json!({ "items": [1] }))));
    }

    #[tokio::test]
    async fn test_push_remote_does_not_count_as_write() {
        let mirror = MemoryMirror::new();
        mirror.push_remote("users/u1/cart/main", json!({ "items": [] }));

        assert_eq!(mirror.write_count("users/u1/cart/main"), 0);
        assert!(mirror.document("users/u1/cart/main").is_some());
    }
}
