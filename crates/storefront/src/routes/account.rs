//! Account route handlers: the saved delivery address.
//!
//! The address lives in a single `addresses/{uid}` document, read and
//! overwritten wholesale like the cart and wishlist mirrors.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// A delivery address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl Address {
    /// Reject addresses with blank required fields.
    pub(crate) fn validate(&self) -> Result<()> {
        let required = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("line1", &self.line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::BadRequest(format!("Missing address field: {field}")));
            }
        }
        Ok(())
    }
}

/// Load the saved address for a user, if any.
pub(crate) async fn load_address(
    state: &AppState,
    uid: &tidepool_core::Uid,
) -> Result<Option<Address>> {
    let doc = state
        .firestore()
        .get_document(&format!("addresses/{uid}"))
        .await?;

    Ok(doc.and_then(|doc| serde_json::from_value(doc.fields).ok()))
}

/// Saved delivery address, or null when none has been saved.
#[instrument(skip(state, user))]
pub async fn address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Option<Address>>> {
    let address = load_address(&state, &user.uid).await?;
    Ok(Json(address))
}

/// Save the delivery address, replacing any previous one.
#[instrument(skip(state, user, address))]
pub async fn save_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(address): Json<Address>,
) -> Result<Json<Address>> {
    address.validate()?;

    let fields = serde_json::to_value(&address)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state
        .firestore()
        .set_document(&format!("addresses/{}", user.uid), &fields)
        .await?;

    Ok(Json(address))
}
