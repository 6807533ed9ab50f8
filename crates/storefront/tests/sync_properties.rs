//! End-to-end behavior of the cart/wishlist stores against the in-memory
//! mirror: mutation semantics, outbound write policy, and rehydration.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use tokio::time::{sleep, timeout};

use tidepool_core::{CartItem, Uid, WishlistItem};
use tidepool_storefront::sync::{CartStore, MemoryMirror, SessionStores, WishlistStore};

fn cart_item(id: &str, size: Option<&str>) -> CartItem {
    CartItem {
        id: id.to_owned(),
        name: format!("Product {id}"),
        price: "19.99".parse().unwrap(),
        original_price: None,
        image: None,
        quantity: 1,
        size: size.map(str::to_owned),
        color: None,
    }
}

fn wishlist_item(id: &str) -> WishlistItem {
    WishlistItem {
        id: id.to_owned(),
        name: format!("Product {id}"),
        price: "19.99".parse().unwrap(),
        original_price: None,
        image: None,
    }
}

/// Poll until `cond` holds, failing the test after one second.
async fn eventually(mut cond: impl FnMut() -> bool) {
    timeout(Duration::from_secs(1), async {
        while !cond() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn wait_for_writes(mirror: &MemoryMirror, path: &str, count: u64) {
    timeout(Duration::from_secs(1), mirror.wait_for_writes(path, count))
        .await
        .expect("expected mirror write did not arrive");
}

#[tokio::test]
async fn replace_then_items_returns_the_same_sequence() {
    let cart = CartStore::new(Uid::new("u1"), MemoryMirror::new());

    let items = vec![cart_item("a", None), cart_item("b", Some("M"))];
    cart.replace(items.clone());

    assert_eq!(cart.items(), items);
    assert_eq!(cart.count(), 2);
}

#[tokio::test]
async fn non_empty_replace_persists_exactly_once() {
    let mirror = MemoryMirror::new();
    let cart = CartStore::new(Uid::new("u1"), mirror.clone());
    let path = "users/u1/cart/main";

    cart.add(cart_item("a", None));
    wait_for_writes(&mirror, path, 1).await;

    assert_eq!(mirror.write_count(path), 1);
    assert_eq!(
        mirror.document(path),
        Some(json!({ "items": serde_json::to_value(cart.items()).unwrap() }))
    );

    // A second mutation is a second full overwrite
    cart.set_quantity("a", 3);
    wait_for_writes(&mirror, path, 2).await;

    assert_eq!(mirror.write_count(path), 2);
    assert_eq!(
        mirror.document(path),
        Some(json!({ "items": serde_json::to_value(cart.items()).unwrap() }))
    );
}

#[tokio::test]
async fn clearing_never_writes_and_leaves_the_last_snapshot() {
    let mirror = MemoryMirror::new();
    let cart = CartStore::new(Uid::new("u1"), mirror.clone());
    let path = "users/u1/cart/main";

    cart.add(cart_item("a", None));
    wait_for_writes(&mirror, path, 1).await;
    let persisted = mirror.document(path);

    cart.clear();
    // Give any stray write task a chance to land
    sleep(Duration::from_millis(50)).await;

    assert!(cart.items().is_empty());
    assert_eq!(mirror.write_count(path), 1);
    assert_eq!(mirror.document(path), persisted);
}

#[tokio::test]
async fn replacing_an_empty_store_with_empty_writes_nothing() {
    let mirror = MemoryMirror::new();
    let cart = CartStore::new(Uid::new("u1"), mirror.clone());

    cart.replace(Vec::new());
    sleep(Duration::from_millis(50)).await;

    assert_eq!(mirror.write_count("users/u1/cart/main"), 0);
    assert!(mirror.document("users/u1/cart/main").is_none());
}

#[tokio::test]
async fn detail_add_appends_duplicates_while_quick_add_dedupes() {
    let cart = CartStore::new(Uid::new("u1"), MemoryMirror::new());

    // Same product in two sizes via the unchecked path: two lines
    cart.add(cart_item("a", Some("M")));
    cart.add(cart_item("a", Some("L")));
    assert_eq!(cart.count(), 2);

    // The checked path refuses a third line for the same product
    assert!(!cart.add_if_absent(cart_item("a", None)));
    assert_eq!(cart.count(), 2);

    assert!(cart.add_if_absent(cart_item("b", None)));
    assert_eq!(cart.count(), 3);
}

#[tokio::test]
async fn set_quantity_zero_is_ignored() {
    let cart = CartStore::new(Uid::new("u1"), MemoryMirror::new());

    cart.add(cart_item("a", None));
    cart.set_quantity("a", 0);
    assert_eq!(cart.items()[0].quantity, 1);

    cart.set_quantity("a", 4);
    assert_eq!(cart.items()[0].quantity, 4);
}

#[tokio::test]
async fn move_to_cart_inserts_once_and_removes_from_wishlist() {
    let mirror = MemoryMirror::new();
    let uid = Uid::new("u1");
    let cart = CartStore::new(uid.clone(), mirror.clone());
    let wishlist = WishlistStore::new(uid, mirror);

    assert!(wishlist.add(wishlist_item("a")));
    assert!(!wishlist.add(wishlist_item("a")));

    assert!(wishlist.move_to_cart(&cart, "a"));
    assert_eq!(cart.count(), 1);
    assert_eq!(cart.items()[0].quantity, 1);
    assert!(wishlist.items().is_empty());

    // Moving again finds nothing
    assert!(!wishlist.move_to_cart(&cart, "a"));

    // Moving a re-wished product does not duplicate the cart line
    assert!(wishlist.add(wishlist_item("a")));
    assert!(wishlist.move_to_cart(&cart, "a"));
    assert_eq!(cart.count(), 1);
}

#[tokio::test]
async fn attach_rehydrates_from_the_remote_snapshot() {
    let mirror = MemoryMirror::new();
    let path = "users/u1/cart/main";
    let stored = vec![cart_item("a", None), cart_item("b", None)];
    mirror.push_remote(path, json!({ "items": serde_json::to_value(&stored).unwrap() }));

    let cart = CartStore::new(Uid::new("u1"), mirror.clone());
    cart.attach();

    eventually(|| cart.count() == 2).await;
    assert_eq!(cart.items(), stored);
}

#[tokio::test]
async fn remote_change_replaces_local_state_wholesale() {
    let mirror = MemoryMirror::new();
    let path = "users/u1/cart/main";
    let cart = CartStore::new(Uid::new("u1"), mirror.clone());
    cart.attach();

    cart.add(cart_item("a", None));
    wait_for_writes(&mirror, path, 1).await;

    // Another device rewrites the document
    let remote = vec![cart_item("x", None)];
    mirror.push_remote(path, json!({ "items": serde_json::to_value(&remote).unwrap() }));

    eventually(|| cart.items() == remote).await;
}

#[tokio::test]
async fn signing_out_and_in_as_another_user_isolates_state() {
    let mirror = MemoryMirror::new();
    let registry = SessionStores::new(mirror.clone());
    let alice = Uid::new("alice");
    let bob = Uid::new("bob");

    let alice_stores = registry.attach(&alice);
    alice_stores.cart.add(cart_item("a", None));
    wait_for_writes(&mirror, "users/alice/cart/main", 1).await;

    // Sign out alice, sign in bob: bob starts empty
    registry.detach(&alice);
    let bob_stores = registry.attach(&bob);
    sleep(Duration::from_millis(50)).await;
    assert!(bob_stores.cart.items().is_empty());

    // Bob's writes land under bob's path only
    bob_stores.cart.add(cart_item("b", None));
    wait_for_writes(&mirror, "users/bob/cart/main", 1).await;
    assert_eq!(mirror.write_count("users/alice/cart/main"), 1);

    // Alice signing back in rehydrates her own cart
    let alice_again = registry.attach(&alice);
    eventually(|| alice_again.cart.count() == 1).await;
    assert_eq!(alice_again.cart.items()[0].id, "a");
}
