//! Wishlist store: typed operations over the wishlist's [`SyncStore`].

use tidepool_core::{Uid, WishlistItem};

use super::{CartStore, CollectionKind, DocumentMirror, SyncStore};

/// Per-user wishlist, mirrored to `users/{uid}/wishlist/main`.
pub struct WishlistStore<M> {
    store: SyncStore<WishlistItem, M>,
}

impl<M> Clone for WishlistStore<M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<M: DocumentMirror> WishlistStore<M> {
    /// Create a detached wishlist store for one user.
    #[must_use]
    pub fn new(uid: Uid, mirror: M) -> Self {
        Self {
            store: SyncStore::new(uid, CollectionKind::Wishlist, mirror),
        }
    }

    /// Start the inbound subscription.
    pub fn attach(&self) {
        self.store.attach();
    }

    /// Stop the subscription and clear memory. Remote document untouched.
    pub fn detach(&self) {
        self.store.detach();
    }

    /// Current in-memory snapshot.
    #[must_use]
    pub fn items(&self) -> Vec<WishlistItem> {
        self.store.items()
    }

    /// Replace the whole wishlist.
    pub fn replace(&self, items: Vec<WishlistItem>) {
        self.store.replace(items);
    }

    /// Add an item unless it is already wished (this path checks by ID).
    /// Returns whether the item was added.
    pub fn add(&self, item: WishlistItem) -> bool {
        let mut items = self.items();
        if items.iter().any(|existing| existing.id == item.id) {
            return false;
        }
        items.push(item);
        self.replace(items);
        true
    }

    /// Remove the item with this product ID.
    pub fn remove(&self, id: &str) {
        let items = self
            .items()
            .into_iter()
            .filter(|item| item.id != id)
            .collect();
        self.replace(items);
    }

    /// Empty the wishlist (memory only; see the mirror's empty policy).
    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    /// Move an item to the cart: insert with quantity 1 unless the cart
    /// already holds that product, then remove it from the wishlist.
    /// Returns whether the item was found.
    pub fn move_to_cart(&self, cart: &CartStore<M>, id: &str) -> bool {
        let Some(item) = self.items().into_iter().find(|item| item.id == id) else {
            return false;
        };

        cart.add_if_absent(item.into_cart_item());
        self.remove(id);
        true
    }

    /// Number of wished items, for the badge.
    #[must_use]
    pub fn count(&self) -> usize {
        self.store.items().len()
    }
}
