//! Home page route handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::services::Product;
use crate::state::AppState;

/// Number of featured products shown on the home page.
const FEATURED_COUNT: usize = 8;

/// A home carousel with its product references resolved.
#[derive(Debug, Serialize)]
pub struct CarouselView {
    pub id: String,
    pub title: String,
    pub products: Vec<Product>,
}

/// Home page payload: carousels plus a featured selection.
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub carousels: Vec<CarouselView>,
    pub featured: Vec<Product>,
}

/// Home page: carousels with resolved products, plus featured products.
///
/// Carousel entries referencing missing products are skipped rather than
/// failing the page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeResponse>> {
    let catalog = state.catalog();

    let mut carousels = Vec::new();
    for carousel in catalog.carousels().await?.iter() {
        let mut products = Vec::new();
        for id in &carousel.product_ids {
            if let Ok(product) = catalog.get_product(id).await {
                products.push(product);
            }
        }
        carousels.push(CarouselView {
            id: carousel.id.clone(),
            title: carousel.title.clone(),
            products,
        });
    }

    let featured = catalog
        .list_products(None, None)
        .await?
        .into_iter()
        .take(FEATURED_COUNT)
        .collect();

    Ok(Json(HomeResponse { carousels, featured }))
}
