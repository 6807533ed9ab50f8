//! Registry of live per-user stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tidepool_core::Uid;

use super::{CartStore, DocumentMirror, WishlistStore, lock};

/// The pair of stores attached for one signed-in user.
pub struct UserStores<M> {
    pub cart: CartStore<M>,
    pub wishlist: WishlistStore<M>,
}

impl<M> Clone for UserStores<M> {
    fn clone(&self) -> Self {
        Self {
            cart: self.cart.clone(),
            wishlist: self.wishlist.clone(),
        }
    }
}

/// Hands out attached [`UserStores`] keyed by user.
///
/// One pair per user regardless of how many sessions they hold; stores are
/// created lazily on first attach and torn down on detach.
pub struct SessionStores<M> {
    mirror: M,
    active: Arc<Mutex<HashMap<Uid, UserStores<M>>>>,
}

impl<M: Clone> Clone for SessionStores<M> {
    fn clone(&self) -> Self {
        Self {
            mirror: self.mirror.clone(),
            active: Arc::clone(&self.active),
        }
    }
}

impl<M: DocumentMirror> SessionStores<M> {
    #[must_use]
    pub fn new(mirror: M) -> Self {
        Self {
            mirror,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the live stores for a user, creating and attaching them on
    /// first sight.
    pub fn attach(&self, uid: &Uid) -> UserStores<M> {
        let mut active = lock(&self.active);
        active
            .entry(uid.clone())
            .or_insert_with(|| {
                let stores = UserStores {
                    cart: CartStore::new(uid.clone(), self.mirror.clone()),
                    wishlist: WishlistStore::new(uid.clone(), self.mirror.clone()),
                };
                stores.cart.attach();
                stores.wishlist.attach();
                stores
            })
            .clone()
    }

    /// Attach stores for `uid`, first tearing down `previous`'s if the
    /// session is swapping to a different identity without an explicit
    /// sign-out.
    ///
    /// Sessions that expire without signing out never reach this path, so
    /// their stores stay attached until the process exits; the in-memory
    /// session store exposes no eviction hook to detach on.
    pub fn reattach(&self, previous: Option<&Uid>, uid: &Uid) -> UserStores<M> {
        if let Some(prev) = previous
            && prev != uid
        {
            self.detach(prev);
        }
        self.attach(uid)
    }

    /// Look up the live stores for a user without creating them.
    #[must_use]
    pub fn get(&self, uid: &Uid) -> Option<UserStores<M>> {
        lock(&self.active).get(uid).cloned()
    }

    /// Tear down a user's stores: stop subscriptions and drop local state.
    ///
    /// The remote documents are untouched, so the next attach rehydrates
    /// from them.
    pub fn detach(&self, uid: &Uid) {
        let removed = lock(&self.active).remove(uid);
        if let Some(stores) = removed {
            stores.cart.detach();
            stores.wishlist.detach();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sync::MemoryMirror;

    #[tokio::test]
    async fn test_attach_is_idempotent_per_user() {
        let registry = SessionStores::new(MemoryMirror::new());
        let uid = Uid::new("u1");

        let first = registry.attach(&uid);
        first.cart.replace(vec![tidepool_core::CartItem {
            id: "p1".into(),
            name: "Tee".into(),
            price: "10".parse().unwrap(),
            original_price: None,
            image: None,
            quantity: 1,
            size: None,
            color: None,
        }]);

        let second = registry.attach(&uid);
        assert_eq!(second.cart.count(), 1);
    }

    #[tokio::test]
    async fn test_reattach_as_another_user_tears_down_the_previous_stores() {
        let registry = SessionStores::new(MemoryMirror::new());
        let alice = Uid::new("alice");
        let bob = Uid::new("bob");

        let first = registry.attach(&alice);
        first.cart.replace(vec![tidepool_core::CartItem {
            id: "p1".into(),
            name: "Tee".into(),
            price: "10".parse().unwrap(),
            original_price: None,
            image: None,
            quantity: 1,
            size: None,
            color: None,
        }]);

        let swapped = registry.reattach(Some(&alice), &bob);

        assert!(registry.get(&alice).is_none());
        assert_eq!(first.cart.count(), 0);
        assert_eq!(swapped.cart.count(), 0);

        // Same identity again is not a swap
        registry.reattach(Some(&bob), &bob);
        assert!(registry.get(&bob).is_some());
    }

    #[tokio::test]
    async fn test_detach_drops_local_state() {
        let registry = SessionStores::new(MemoryMirror::new());
        let uid = Uid::new("u1");

        let stores = registry.attach(&uid);
        stores.wishlist.add(tidepool_core::WishlistItem {
            id: "p1".into(),
            name: "Tee".into(),
            price: "10".parse().unwrap(),
            original_price: None,
            image: None,
        });
        registry.detach(&uid);

        assert!(registry.get(&uid).is_none());
        assert_eq!(stores.wishlist.count(), 0);
    }
}
