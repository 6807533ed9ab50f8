//! Firestore and Identity Toolkit REST clients.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest` - no SDK, no gRPC
//! - The backend is source of truth - NO local persistence, direct API calls
//! - Document watch is surfaced as a channel-backed subscription; the REST
//!   transport polls and forwards a snapshot only when the document revision
//!   changes
//!
//! # APIs
//!
//! ## Firestore
//! - Per-user cart and wishlist mirror documents
//! - Catalog, order, address, and carousel documents
//!
//! ## Identity Toolkit
//! - Email/password sign-up and sign-in
//! - Phone OTP sign-in
//!
//! # Example
//!
//! ```rust,ignore
//! use tidepool_storefront::firebase::FirestoreClient;
//!
//! let firestore = FirestoreClient::new(&config.firebase);
//!
//! // Read the catalog
//! let products = firestore.list_documents("products").await?;
//!
//! // Overwrite a user's cart mirror
//! firestore
//!     .set_document("users/u1/cart/main", json!({ "items": items }))
//!     .await?;
//! ```

mod firestore;
mod identity;
pub mod value;

pub use firestore::{Document, FirestoreClient};
pub use identity::{AuthError, AuthUser, IdentityClient, OtpChallenge};

use thiserror::Error;

/// Errors that can occur when talking to the Firestore REST API.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Document not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_firestore_error_display() {
        let err = FirestoreError::NotFound("products/p-1".to_string());
        assert_eq!(err.to_string(), "Not found: products/p-1");

        let err = FirestoreError::Api {
            status: 403,
            message: "Missing or insufficient permissions".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error (403): Missing or insufficient permissions"
        );
    }

    #[test]
    fn test_rate_limited_display() {
        let err = FirestoreError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
    }
}
