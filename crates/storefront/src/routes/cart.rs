//! Cart route handlers.
//!
//! All cart state lives in the signed-in user's [`CartStore`]; handlers
//! mutate it and return the resulting snapshot. Store mutations are
//! mirrored to the backend asynchronously, so responses never wait on the
//! mirror write.
//!
//! [`CartStore`]: crate::sync::CartStore

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tidepool_core::CartItem;
use tracing::instrument;

use crate::error::Result;
use crate::firebase::FirestoreClient;
use crate::middleware::RequireAuth;
use crate::services::Product;
use crate::state::AppState;
use crate::sync::{CartStore, UserStores};

/// Cart snapshot returned by every cart handler.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub count: usize,
}

impl CartResponse {
    fn from_store(cart: &CartStore<FirestoreClient>) -> Self {
        Self {
            items: cart.items(),
            total: cart.total(),
            count: cart.count(),
        }
    }
}

/// Add to cart request (detail page): product plus chosen options.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    pub product_id: String,
    pub quantity: Option<u32>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Quick-add request (listing card): product only, quantity 1.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAddRequest {
    pub product_id: String,
}

/// Update request: any provided field is applied to the matching lines.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub product_id: String,
    pub quantity: Option<u32>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Remove request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub product_id: String,
}

/// Fetch (or lazily create) the signed-in user's stores.
fn user_stores(state: &AppState, user: &crate::models::CurrentUser) -> UserStores<FirestoreClient> {
    state.stores().attach(&user.uid)
}

/// Build a cart line from a catalog product and the chosen options.
fn cart_item(product: Product, quantity: u32, size: Option<String>, color: Option<String>) -> CartItem {
    CartItem {
        id: product.id,
        name: product.name,
        price: product.price,
        original_price: product.original_price,
        image: product.image,
        quantity,
        size,
        color,
    }
}

/// Current cart contents.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let stores = user_stores(&state, &user);
    Ok(Json(CartResponse::from_store(&stores.cart)))
}

/// Add a line from the product detail page.
///
/// This path performs no duplicate check: adding the same product again
/// (e.g. in a second size) appends a second line.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<AddRequest>,
) -> Result<Json<CartResponse>> {
    let product = state.catalog().get_product(&req.product_id).await?;
    let stores = user_stores(&state, &user);

    let quantity = req.quantity.unwrap_or(1).max(1);
    stores
        .cart
        .add(cart_item(product, quantity, req.size, req.color));

    Ok(Json(CartResponse::from_store(&stores.cart)))
}

/// Add a line from a listing card, skipped when the product is already in
/// the cart.
#[instrument(skip(state, user))]
pub async fn quick_add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<QuickAddRequest>,
) -> Result<Json<CartResponse>> {
    let product = state.catalog().get_product(&req.product_id).await?;
    let stores = user_stores(&state, &user);

    stores.cart.add_if_absent(cart_item(product, 1, None, None));

    Ok(Json(CartResponse::from_store(&stores.cart)))
}

/// Update quantity, size, or color on every line with the given product.
///
/// A quantity of zero is ignored; lines are removed via `/cart/remove`,
/// not by driving the quantity down.
#[instrument(skip(state, user))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<CartResponse>> {
    let stores = user_stores(&state, &user);

    if let Some(quantity) = req.quantity {
        stores.cart.set_quantity(&req.product_id, quantity);
    }
    if let Some(size) = req.size {
        stores.cart.set_size(&req.product_id, size);
    }
    if let Some(color) = req.color {
        stores.cart.set_color(&req.product_id, color);
    }

    Ok(Json(CartResponse::from_store(&stores.cart)))
}

/// Remove every line with the given product.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<RemoveRequest>,
) -> Result<Json<CartResponse>> {
    let stores = user_stores(&state, &user);
    stores.cart.remove(&req.product_id);
    Ok(Json(CartResponse::from_store(&stores.cart)))
}

/// Empty the cart.
#[instrument(skip(state, user))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let stores = user_stores(&state, &user);
    stores.cart.clear();
    Ok(Json(CartResponse::from_store(&stores.cart)))
}

/// Line count for the header badge.
#[instrument(skip(state, user))]
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<serde_json::Value>> {
    let stores = user_stores(&state, &user);
    Ok(Json(serde_json::json!({ "count": stores.cart.count() })))
}
