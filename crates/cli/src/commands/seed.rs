//! Seed the backend catalog collections.
//!
//! Seeding writes documents with fixed IDs, so re-running it is idempotent:
//! existing documents are overwritten, never duplicated.

use serde::Deserialize;
use tracing::info;

use tidepool_storefront::config::FirebaseConfig;
use tidepool_storefront::firebase::FirestoreClient;
use tidepool_storefront::services::{Carousel, Product};

/// Built-in demo catalog.
const BUILTIN_SEED: &str = include_str!("../../data/seed.json");

type CliError = Box<dyn std::error::Error>;

/// A seed document: products and carousels to write.
#[derive(Debug, Deserialize)]
struct SeedData {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    carousels: Vec<Carousel>,
}

/// Seed the products collection.
///
/// # Errors
///
/// Returns an error if configuration is missing, the seed file cannot be
/// read, or a write fails.
pub async fn products(file: Option<&str>) -> Result<(), CliError> {
    let seed = load_seed(file)?;
    let client = client()?;
    write_products(&client, &seed.products).await?;
    info!(count = seed.products.len(), "Product seeding complete");
    Ok(())
}

/// Seed the home carousels collection.
///
/// # Errors
///
/// Returns an error if configuration is missing, the seed file cannot be
/// read, or a write fails.
pub async fn carousels(file: Option<&str>) -> Result<(), CliError> {
    let seed = load_seed(file)?;
    let client = client()?;
    write_carousels(&client, &seed.carousels).await?;
    info!(count = seed.carousels.len(), "Carousel seeding complete");
    Ok(())
}

/// Seed products and carousels.
///
/// # Errors
///
/// Returns an error if configuration is missing, the seed file cannot be
/// read, or a write fails.
pub async fn all(file: Option<&str>) -> Result<(), CliError> {
    let seed = load_seed(file)?;
    let client = client()?;
    write_products(&client, &seed.products).await?;
    write_carousels(&client, &seed.carousels).await?;
    info!(
        products = seed.products.len(),
        carousels = seed.carousels.len(),
        "Seeding complete"
    );
    Ok(())
}

fn load_seed(file: Option<&str>) -> Result<SeedData, CliError> {
    let content = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {path}: {e}"))?,
        None => BUILTIN_SEED.to_string(),
    };
    Ok(serde_json::from_str(&content)?)
}

fn client() -> Result<FirestoreClient, CliError> {
    dotenvy::dotenv().ok();
    let config = FirebaseConfig::from_env()?;
    Ok(FirestoreClient::new(&config))
}

async fn write_products(client: &FirestoreClient, products: &[Product]) -> Result<(), CliError> {
    for product in products {
        client
            .set_document(&format!("products/{}", product.id), &strip_id(product)?)
            .await?;
        info!(id = %product.id, name = %product.name, "Seeded product");
    }
    Ok(())
}

async fn write_carousels(client: &FirestoreClient, carousels: &[Carousel]) -> Result<(), CliError> {
    for carousel in carousels {
        client
            .set_document(&format!("carousels/{}", carousel.id), &strip_id(carousel)?)
            .await?;
        info!(id = %carousel.id, title = %carousel.title, "Seeded carousel");
    }
    Ok(())
}

/// The `id` lives in the document name, not the fields.
fn strip_id<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, CliError> {
    let mut fields = serde_json::to_value(value)?;
    if let Some(map) = fields.as_object_mut() {
        map.remove("id");
    }
    Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_seed_parses() {
        let seed: SeedData = serde_json::from_str(BUILTIN_SEED).unwrap();
        assert!(!seed.products.is_empty());
        assert!(!seed.carousels.is_empty());

        // Carousels must only reference seeded products
        for carousel in &seed.carousels {
            for id in &carousel.product_ids {
                assert!(
                    seed.products.iter().any(|p| &p.id == id),
                    "carousel {} references unknown product {id}",
                    carousel.id
                );
            }
        }
    }

    #[test]
    fn test_strip_id_removes_id() {
        let product = &serde_json::from_str::<SeedData>(BUILTIN_SEED).unwrap().products[0];
        let fields = strip_id(product).unwrap();
        assert!(fields.get("id").is_none());
        assert!(fields.get("name").is_some());
    }
}
