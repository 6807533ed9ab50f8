//! Product catalog backed by the document store.
//!
//! Catalog reads are cached using `moka` (5-minute TTL); admin writes
//! invalidate the whole cache. Search and category filters are applied
//! in memory after the cached fetch, linear over the catalog.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::firebase::{Document, FirestoreClient, FirestoreError};

/// A catalog product, as stored in the `products` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Document ID. Injected from the resource name, not stored as a field.
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "originalPrice",
        with = "rust_decimal::serde::float_option"
    )]
    pub original_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Size options offered on the detail page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
    /// Color options offered on the detail page.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
}

/// A home-page carousel, as stored in the `carousels` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carousel {
    #[serde(default)]
    pub id: String,
    pub title: String,
    /// Products shown in the carousel, in display order.
    #[serde(default, rename = "productIds")]
    pub product_ids: Vec<String>,
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
    Carousels(Arc<Vec<Carousel>>),
}

/// Catalog reads and admin writes over the `products` and `carousels`
/// collections.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    firestore: FirestoreClient,
    cache: Cache<String, CacheValue>,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(firestore: FirestoreClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner { firestore, cache }),
        }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::NotFound` if the product does not exist, or
    /// an error if the request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: &str) -> Result<Product, FirestoreError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let doc = self
            .inner
            .firestore
            .get_document(&format!("products/{id}"))
            .await?
            .ok_or_else(|| FirestoreError::NotFound(format!("Product not found: {id}")))?;

        let product = product_from_document(doc)
            .ok_or_else(|| FirestoreError::NotFound(format!("Product not found: {id}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List products, optionally filtered by a search query and a category.
    ///
    /// The search is a case-insensitive substring match on name and
    /// description; the category filter is an exact match. Both run linearly
    /// over the full catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing fetch fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Product>, FirestoreError> {
        let all = self.all_products().await?;

        let filtered = all
            .iter()
            .filter(|product| {
                category.is_none_or(|c| product.category.as_deref() == Some(c))
                    && query.is_none_or(|q| matches_query(product, q))
            })
            .cloned()
            .collect();

        Ok(filtered)
    }

    /// List the home-page carousels.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing fetch fails.
    #[instrument(skip(self))]
    pub async fn carousels(&self) -> Result<Arc<Vec<Carousel>>, FirestoreError> {
        let cache_key = "carousels:all".to_string();

        if let Some(CacheValue::Carousels(carousels)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for carousels");
            return Ok(carousels);
        }

        let docs = self.inner.firestore.list_documents("carousels").await?;
        let carousels: Arc<Vec<Carousel>> = Arc::new(
            docs.into_iter()
                .filter_map(|doc| decode_named(doc, "carousel"))
                .collect(),
        );

        self.inner
            .cache
            .insert(cache_key, CacheValue::Carousels(Arc::clone(&carousels)))
            .await;

        Ok(carousels)
    }

    /// Create a product with a server-assigned ID. Returns the new ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    #[instrument(skip(self, product))]
    pub async fn create_product(&self, product: &Product) -> Result<String, FirestoreError> {
        let fields = strip_id(serde_json::to_value(product)?);
        let id = self
            .inner
            .firestore
            .create_document("products", &fields)
            .await?;
        self.inner.cache.invalidate_all();
        Ok(id)
    }

    /// Delete a product. Deleting a missing product is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: &str) -> Result<(), FirestoreError> {
        self.inner
            .firestore
            .delete_document(&format!("products/{id}"))
            .await?;
        self.inner.cache.invalidate_all();
        Ok(())
    }

    /// Create a carousel with a server-assigned ID. Returns the new ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    #[instrument(skip(self, carousel))]
    pub async fn create_carousel(&self, carousel: &Carousel) -> Result<String, FirestoreError> {
        let fields = strip_id(serde_json::to_value(carousel)?);
        let id = self
            .inner
            .firestore
            .create_document("carousels", &fields)
            .await?;
        self.inner.cache.invalidate_all();
        Ok(id)
    }

    /// Fetch the full product list, cached.
    async fn all_products(&self) -> Result<Arc<Vec<Product>>, FirestoreError> {
        let cache_key = "products:all".to_string();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let docs = self.inner.firestore.list_documents("products").await?;
        let products: Arc<Vec<Product>> = Arc::new(
            docs.into_iter().filter_map(product_from_document).collect(),
        );

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
            .await;

        Ok(products)
    }
}

/// Case-insensitive substring match on name and description.
fn matches_query(product: &Product, query: &str) -> bool {
    let needle = query.to_lowercase();
    product.name.to_lowercase().contains(&needle)
        || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle))
}

/// Decode a product document, injecting the document ID.
fn product_from_document(doc: Document) -> Option<Product> {
    decode_named(doc, "product")
}

/// Decode a typed document, injecting the document ID. Undecodable
/// documents are logged and skipped rather than failing the listing.
fn decode_named<T: serde::de::DeserializeOwned + HasId>(doc: Document, kind: &str) -> Option<T> {
    let id = doc.id;
    match serde_json::from_value::<T>(doc.fields) {
        Ok(mut value) => {
            value.set_id(id);
            Some(value)
        }
        Err(e) => {
            warn!(id = %id, error = %e, "Skipping undecodable {kind} document");
            None
        }
    }
}

/// Drop the `id` field before writing; it lives in the document name.
fn strip_id(mut value: Value) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.remove("id");
    }
    value
}

trait HasId {
    fn set_id(&mut self, id: String);
}

impl HasId for Product {
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl HasId for Carousel {
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(name: &str, description: Option<&str>, category: Option<&str>) -> Product {
        Product {
            id: "p".to_owned(),
            name: name.to_owned(),
            price: "10".parse().unwrap(),
            original_price: None,
            image: None,
            category: category.map(str::to_owned),
            description: description.map(str::to_owned),
            sizes: Vec::new(),
            colors: Vec::new(),
        }
    }

    #[test]
    fn test_matches_query_name_and_description() {
        let p = product("Wireless Headphones", Some("Noise cancelling"), None);
        assert!(matches_query(&p, "wireless"));
        assert!(matches_query(&p, "NOISE"));
        assert!(!matches_query(&p, "keyboard"));
    }

    #[test]
    fn test_product_from_document_injects_id() {
        let doc = Document {
            id: "p-42".to_owned(),
            fields: json!({
                "name": "Smart Watch",
                "price": 149.99,
                "originalPrice": 199.99,
                "category": "electronics"
            }),
            update_time: None,
        };

        let p = product_from_document(doc).unwrap();
        assert_eq!(p.id, "p-42");
        assert!(p.original_price.is_some());
    }

    #[test]
    fn test_product_from_document_skips_garbage() {
        let doc = Document {
            id: "bad".to_owned(),
            fields: json!({ "price": "not a number" }),
            update_time: None,
        };
        assert!(product_from_document(doc).is_none());
    }

    #[test]
    fn test_strip_id_removes_id_field() {
        let value = strip_id(json!({ "id": "p-1", "name": "Tee" }));
        assert_eq!(value, json!({ "name": "Tee" }));
    }
}
