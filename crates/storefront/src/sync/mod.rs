//! Session-scoped collection stores mirrored to per-user backend documents.
//!
//! # Architecture
//!
//! Each signed-in user gets one [`CartStore`] and one [`WishlistStore`],
//! both thin typed wrappers over the same [`SyncStore`]. A store holds the
//! authoritative in-memory sequence of line items and keeps it eventually
//! consistent with a single remote document (`users/{uid}/cart/main`,
//! `users/{uid}/wishlist/main`):
//!
//! - inbound: a live subscription on the document; every snapshot replaces
//!   the in-memory sequence wholesale (remote is authoritative on inbound);
//! - outbound: every [`SyncStore::replace`] that yields a *non-empty*
//!   sequence schedules a fire-and-forget full overwrite of the document.
//!   An empty result never writes, so clearing a collection leaves the last
//!   non-empty remote snapshot intact until the next non-empty write.
//!
//! There is no merge, no diff, and no ordering between in-flight
//! overwrites: if two mutations race, the later-completing write persists
//! (the backend's own last-write-wins model). Mirror write failures are
//! logged and dropped; the in-memory state already reflects the mutation.
//!
//! Stores are built against the [`DocumentMirror`] seam rather than the
//! concrete backend client, so they unit-test against [`MemoryMirror`].

mod cart;
mod memory;
mod registry;
mod wishlist;

pub use cart::CartStore;
pub use memory::MemoryMirror;
pub use registry::{SessionStores, UserStores};
pub use wishlist::WishlistStore;

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use tidepool_core::Uid;

/// Error type carried by failed mirror writes. Only ever logged.
pub type MirrorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The remote document store seam consumed by the sync stores.
///
/// Implemented by the Firestore client for production and by
/// [`MemoryMirror`] for tests.
pub trait DocumentMirror: Clone + Send + Sync + 'static {
    /// Open a live subscription on the document at `path`.
    ///
    /// The subscription delivers an initial snapshot (possibly of a missing
    /// document) followed by one snapshot per observed change, for as long
    /// as it is held. Dropping it cancels the subscription.
    fn subscribe(&self, path: &str) -> Subscription;

    /// Replace the entire contents of the document at `path`.
    fn overwrite(
        &self,
        path: &str,
        fields: Value,
    ) -> impl Future<Output = Result<(), MirrorError>> + Send;
}

/// A live document subscription.
///
/// Snapshots are `None` when the document does not exist.
pub struct Subscription {
    rx: mpsc::Receiver<Option<Value>>,
    _guard: Option<TaskGuard>,
}

impl Subscription {
    /// Wrap a snapshot channel.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<Option<Value>>) -> Self {
        Self { rx, _guard: None }
    }

    /// Wrap a snapshot channel fed by a background task that should be
    /// cancelled when the subscription is dropped.
    #[must_use]
    pub fn with_guard(rx: mpsc::Receiver<Option<Value>>, guard: TaskGuard) -> Self {
        Self {
            rx,
            _guard: Some(guard),
        }
    }

    /// Wait for the next snapshot. Returns `None` once the feed closes.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        self.rx.recv().await
    }
}

/// Aborts the wrapped task on drop.
pub struct TaskGuard(JoinHandle<()>);

impl TaskGuard {
    /// Take ownership of a task handle.
    #[must_use]
    pub const fn new(handle: JoinHandle<()>) -> Self {
        Self(handle)
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Which per-user collection a store mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Cart,
    Wishlist,
}

impl CollectionKind {
    /// Collection name segment in the document path.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Wishlist => "wishlist",
        }
    }

    /// Path of the mirror document for one user.
    #[must_use]
    pub fn document_path(self, uid: &Uid) -> String {
        format!("users/{uid}/{}/main", self.as_str())
    }
}

/// A session-scoped, remotely mirrored sequence of line items.
///
/// `replace` is the sole mutation primitive; every higher-level operation
/// computes a new full sequence and passes it in. The UI layer never
/// mutates a returned sequence in place.
pub struct SyncStore<T, M> {
    inner: Arc<StoreInner<T, M>>,
}

impl<T, M> Clone for SyncStore<T, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<T, M> {
    uid: Uid,
    kind: CollectionKind,
    path: String,
    mirror: M,
    items: RwLock<Vec<T>>,
    listener: Mutex<Option<TaskGuard>>,
}

impl<T, M> SyncStore<T, M>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    M: DocumentMirror,
{
    /// Create a detached store for one user and collection kind.
    #[must_use]
    pub fn new(uid: Uid, kind: CollectionKind, mirror: M) -> Self {
        let path = kind.document_path(&uid);
        Self {
            inner: Arc::new(StoreInner {
                uid,
                kind,
                path,
                mirror,
                items: RwLock::new(Vec::new()),
                listener: Mutex::new(None),
            }),
        }
    }

    /// The user this store belongs to.
    #[must_use]
    pub fn uid(&self) -> &Uid {
        &self.inner.uid
    }

    /// The collection kind this store mirrors.
    #[must_use]
    pub fn kind(&self) -> CollectionKind {
        self.inner.kind
    }

    /// Start the inbound subscription.
    ///
    /// Idempotent: re-attaching replaces the previous subscription. The
    /// listener task holds only a weak reference, so dropping the last
    /// store handle ends it.
    pub fn attach(&self) {
        let mut subscription = self.inner.mirror.subscribe(&self.inner.path);
        let weak: Weak<StoreInner<T, M>> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            while let Some(snapshot) = subscription.next().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                apply_remote(&inner, snapshot);
            }
        });

        let mut listener = lock(&self.inner.listener);
        *listener = Some(TaskGuard::new(handle));
    }

    /// Stop the subscription and clear memory.
    ///
    /// The remote document is left untouched; an in-flight overwrite may
    /// still complete and persist after detach.
    pub fn detach(&self) {
        let guard = lock(&self.inner.listener).take();
        drop(guard);
        read_write(&self.inner.items).clear();
    }

    /// Current in-memory snapshot.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.inner
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the whole sequence.
    ///
    /// Memory is updated synchronously. A non-empty result schedules one
    /// full overwrite of the remote document; an empty result writes
    /// nothing (empty collections are never persisted over a previously
    /// non-empty document). The overwrite is fire-and-forget: failures are
    /// logged at warn and never surfaced to the caller.
    pub fn replace(&self, new_items: Vec<T>) {
        let payload = if new_items.is_empty() {
            None
        } else {
            match serde_json::to_value(&new_items) {
                Ok(value) => Some(json!({ "items": value })),
                Err(e) => {
                    warn!(
                        path = %self.inner.path,
                        error = %e,
                        "Failed to serialize items for mirror write"
                    );
                    None
                }
            }
        };

        *read_write(&self.inner.items) = new_items;

        let Some(payload) = payload else { return };

        let mirror = self.inner.mirror.clone();
        let path = self.inner.path.clone();
        tokio::spawn(async move {
            if let Err(e) = mirror.overwrite(&path, payload).await {
                // No retry, no rollback of the in-memory state
                warn!(path = %path, error = %e, "Mirror write failed");
            }
        });
    }
}

/// Inbound snapshot handler: remote is authoritative, memory is replaced
/// wholesale. Never writes back.
fn apply_remote<T, M>(inner: &StoreInner<T, M>, snapshot: Option<Value>)
where
    T: DeserializeOwned,
{
    let items: Vec<T> = snapshot
        .as_ref()
        .and_then(|fields| fields.get("items"))
        .cloned()
        .map_or_else(Vec::new, |value| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(path = %inner.path, error = %e, "Undecodable mirror snapshot, treating as empty");
                Vec::new()
            })
        });

    *read_write(&inner.items) = items;
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_write<T>(rwlock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    rwlock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_path_convention() {
        let uid = Uid::new("u1");
        assert_eq!(
            CollectionKind::Cart.document_path(&uid),
            "users/u1/cart/main"
        );
        assert_eq!(
            CollectionKind::Wishlist.document_path(&uid),
            "users/u1/wishlist/main"
        );
    }
}
