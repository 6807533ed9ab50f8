//! Wishlist route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tidepool_core::WishlistItem;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::firebase::FirestoreClient;
use crate::middleware::RequireAuth;
use crate::state::AppState;
use crate::sync::UserStores;

/// Wishlist snapshot returned by every wishlist handler.
#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub items: Vec<WishlistItem>,
    pub count: usize,
}

impl WishlistResponse {
    fn from_stores(stores: &UserStores<FirestoreClient>) -> Self {
        Self {
            items: stores.wishlist.items(),
            count: stores.wishlist.count(),
        }
    }
}

/// Add/remove/move request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub product_id: String,
}

/// Current wishlist contents.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<WishlistResponse>> {
    let stores = state.stores().attach(&user.uid);
    Ok(Json(WishlistResponse::from_stores(&stores)))
}

/// Add an item. Already-wished products are left alone.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<ItemRequest>,
) -> Result<Json<WishlistResponse>> {
    let product = state.catalog().get_product(&req.product_id).await?;
    let stores = state.stores().attach(&user.uid);

    stores.wishlist.add(WishlistItem {
        id: product.id,
        name: product.name,
        price: product.price,
        original_price: product.original_price,
        image: product.image,
    });

    Ok(Json(WishlistResponse::from_stores(&stores)))
}

/// Remove an item.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<ItemRequest>,
) -> Result<Json<WishlistResponse>> {
    let stores = state.stores().attach(&user.uid);
    stores.wishlist.remove(&req.product_id);
    Ok(Json(WishlistResponse::from_stores(&stores)))
}

/// Empty the wishlist.
#[instrument(skip(state, user))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<WishlistResponse>> {
    let stores = state.stores().attach(&user.uid);
    stores.wishlist.clear();
    Ok(Json(WishlistResponse::from_stores(&stores)))
}

/// Move an item into the cart (quantity 1, deduped by product id), then
/// remove it from the wishlist.
#[instrument(skip(state, user))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<ItemRequest>,
) -> Result<Json<WishlistResponse>> {
    let stores = state.stores().attach(&user.uid);

    if !stores.wishlist.move_to_cart(&stores.cart, &req.product_id) {
        return Err(AppError::NotFound(format!(
            "Item not in wishlist: {}",
            req.product_id
        )));
    }

    Ok(Json(WishlistResponse::from_stores(&stores)))
}
