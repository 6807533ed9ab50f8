//! Admin catalog management route handlers.
//!
//! Any signed-in user may manage the catalog; there is no separate role
//! model in the backend's security rules.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{Carousel, Product};
use crate::state::AppState;

/// Response carrying a newly created document ID.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// Full catalog listing, unfiltered.
#[instrument(skip(state, _user))]
pub async fn list_products(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    let products = state.catalog().list_products(None, None).await?;
    Ok(Json(products))
}

/// Create a product. The `id` field in the body is ignored; the backend
/// assigns one.
#[instrument(skip(state, user, product))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(product): Json<Product>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let id = state.catalog().create_product(&product).await?;
    info!(id = %id, uid = %user.uid, "Product created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Delete a product. Deleting a missing product succeeds.
#[instrument(skip(state, user))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.catalog().delete_product(&id).await?;
    info!(id = %id, uid = %user.uid, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Create a home carousel.
#[instrument(skip(state, user, carousel))]
pub async fn create_carousel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(carousel): Json<Carousel>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let id = state.catalog().create_carousel(&carousel).await?;
    info!(id = %id, uid = %user.uid, "Carousel created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}
