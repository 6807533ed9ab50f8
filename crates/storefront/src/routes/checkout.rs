//! Checkout route handlers.
//!
//! Placing an order writes an `orders` document and then empties the cart.
//! The order write surfaces failure to the caller; the subsequent
//! cart-mirror write keeps the stores' fire-and-forget behavior (and, per
//! the empty-sequence policy, the last non-empty cart snapshot stays in
//! the mirror document).

use axum::{Json, extract::State};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tidepool_core::CartItem;
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::account::{Address, load_address};
use crate::state::AppState;

/// Payment selection. Card numbers never reach this service; the client
/// sends only the method and, for cards, the last four digits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
}

/// Checkout summary: cart contents plus the saved address, if any.
#[derive(Debug, Serialize)]
pub struct CheckoutSummary {
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub address: Option<Address>,
}

/// Place-order request.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub address: Address,
    pub payment: PaymentInfo,
}

/// The order document written to the `orders` collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderDocument {
    uid: String,
    items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,
    address: Address,
    payment: PaymentInfo,
    created_at: String,
}

impl OrderDocument {
    /// The total is derived from the carried items, never read back from
    /// the live store, so the persisted order is internally consistent
    /// even if the cart mutates while the order write is in flight.
    fn new(uid: &str, items: Vec<CartItem>, address: Address, payment: PaymentInfo) -> Self {
        let total = tidepool_core::cart_total(&items);
        Self {
            uid: uid.to_owned(),
            items,
            total,
            address,
            payment,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Place-order response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Checkout summary for the review step.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CheckoutSummary>> {
    let stores = state.stores().attach(&user.uid);
    let address = load_address(&state, &user.uid).await?;

    let items = stores.cart.items();
    let total = tidepool_core::cart_total(&items);
    Ok(Json(CheckoutSummary {
        items,
        total,
        address,
    }))
}

/// Place the order.
#[instrument(skip(state, user, req))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<OrderResponse>> {
    let stores = state.stores().attach(&user.uid);

    let items = stores.cart.items();
    if items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    req.address.validate()?;
    if req.payment.method.trim().is_empty() {
        return Err(AppError::BadRequest("Missing payment method".to_string()));
    }

    let order = OrderDocument::new(user.uid.as_str(), items, req.address, req.payment);
    let total = order.total;

    let fields = serde_json::to_value(&order)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let order_id = state.firestore().create_document("orders", &fields).await?;

    // Cart clears only after the order write succeeds
    stores.cart.clear();

    info!(order_id = %order_id, uid = %user.uid, "Order placed");

    Ok(Json(OrderResponse { order_id, total }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, price: &str, quantity: u32) -> CartItem {
        CartItem {
            id: id.to_owned(),
            name: format!("Product {id}"),
            price: price.parse().unwrap(),
            original_price: None,
            image: None,
            quantity,
            size: None,
            color: None,
        }
    }

    fn address() -> Address {
        Address {
            name: "A Customer".into(),
            phone: "5550100".into(),
            line1: "1 Shore Rd".into(),
            line2: None,
            city: "Tidetown".into(),
            state: "CA".into(),
            postal_code: "90000".into(),
        }
    }

    #[test]
    fn test_order_total_is_derived_from_the_carried_items() {
        let items = vec![item("a", "19.99", 2), item("b", "5.00", 1)];
        let payment = PaymentInfo {
            method: "card".into(),
            card_last4: Some("4242".into()),
        };

        let order = OrderDocument::new("u1", items, address(), payment);

        assert_eq!(order.total, "44.98".parse().unwrap());
        let fields = serde_json::to_value(&order).unwrap();
        assert_eq!(fields["total"], serde_json::json!(44.98));
        assert_eq!(fields["items"].as_array().unwrap().len(), 2);
    }
}
