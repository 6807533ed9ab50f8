//! Application state shared across handlers.

use std::sync::Arc;

use url::Url;

use crate::config::StorefrontConfig;
use crate::firebase::{FirestoreClient, IdentityClient};
use crate::services::CatalogService;
use crate::sync::SessionStores;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid base_url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("base_url must have a host")]
    MissingHost,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    firestore: FirestoreClient,
    identity: IdentityClient,
    catalog: CatalogService,
    stores: SessionStores<FirestoreClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is malformed.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let url = Url::parse(&config.base_url)?;
        if url.host_str().is_none() {
            return Err(StateError::MissingHost);
        }

        let firestore = FirestoreClient::new(&config.firebase);
        let identity = IdentityClient::new(&config.firebase);
        let catalog = CatalogService::new(firestore.clone());
        let stores = SessionStores::new(firestore.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                firestore,
                identity,
                catalog,
                stores,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Firestore client.
    #[must_use]
    pub fn firestore(&self) -> &FirestoreClient {
        &self.inner.firestore
    }

    /// Get a reference to the Identity Toolkit client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the per-user store registry.
    #[must_use]
    pub fn stores(&self) -> &SessionStores<FirestoreClient> {
        &self.inner.stores
    }
}
