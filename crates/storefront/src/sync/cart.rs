//! Cart store: typed operations over the cart's [`SyncStore`].
//!
//! Every operation computes a new full sequence and hands it to
//! [`SyncStore::replace`]; there is no incremental/patch path.

use rust_decimal::Decimal;

use tidepool_core::{CartItem, Uid, cart_total};

use super::{CollectionKind, DocumentMirror, SyncStore};

/// Per-user cart, mirrored to `users/{uid}/cart/main`.
pub struct CartStore<M> {
    store: SyncStore<CartItem, M>,
}

impl<M> Clone for CartStore<M> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<M: DocumentMirror> CartStore<M> {
    /// Create a detached cart store for one user.
    #[must_use]
    pub fn new(uid: Uid, mirror: M) -> Self {
        Self {
            store: SyncStore::new(uid, CollectionKind::Cart, mirror),
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
    pub fn items(&self) -> Vec<CartItem> {
        self.store.items()
    }

    /// Replace the whole cart.
    pub fn replace(&self, items: Vec<CartItem>) {
        self.store.replace(items);
    }

    /// Append a line.
    ///
    /// The detail-page add path: no duplicate check, so adding the same
    /// product again (e.g. in another size) yields a second entry.
    pub fn add(&self, item: CartItem) {
        let mut items = self.items();
        items.push(item);
        self.replace(items);
    }

    /// Append a line unless a line with the same product ID already exists.
    ///
    /// The listing-card and move-from-wishlist add path, which does check.
    /// Returns whether the item was added.
    pub fn add_if_absent(&self, item: CartItem) -> bool {
        let mut items = self.items();
        if items.iter().any(|existing| existing.id == item.id) {
            return false;
        }
        items.push(item);
        self.replace(items);
        true
    }

    /// Remove every line with this product ID.
    pub fn remove(&self, id: &str) {
        let items = self
            .items()
            .into_iter()
            .filter(|item| item.id != id)
            .collect();
        self.replace(items);
    }

    /// Set the quantity on every line with this product ID.
    ///
    /// Zero is ignored; the quantity floor is 1.
    pub fn set_quantity(&self, id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        self.update(id, |item| item.quantity = quantity);
    }

    /// Set the size on every line with this product ID.
    pub fn set_size(&self, id: &str, size: String) {
        self.update(id, |item| item.size = Some(size.clone()));
    }

    /// Set the color on every line with this product ID.
    pub fn set_color(&self, id: &str, color: String) {
        self.update(id, |item| item.color = Some(color.clone()));
    }

    /// Empty the cart.
    ///
    /// Per the mirror's empty-sequence policy this clears memory only; the
    /// last non-empty remote snapshot remains until the next non-empty
    /// write.
    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    /// Sum of price times quantity over the cart.
    #[must_use]
    pub fn total(&self) -> Decimal {
        cart_total(&self.items())
    }

    /// Number of lines (not units) in the cart, for the badge.
    #[must_use]
    pub fn count(&self) -> usize {
        self.store.items().len()
    }

    fn update(&self, id: &str, mut apply: impl FnMut(&mut CartItem)) {
        let mut items = self.items();
        for item in items.iter_mut().filter(|item| item.id == id) {
            apply(item);
        }
        self.replace(items);
    }
}
