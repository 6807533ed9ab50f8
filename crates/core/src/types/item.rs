//! Line items held in a cart or wishlist, and their view projections.
//!
//! A line item's `id` equals the source product's document ID. It is *not*
//! unique within a collection: adding the same product twice (e.g. in two
//! sizes) produces two entries, and only some add paths check for
//! duplicates. That looseness is load-bearing application behavior, not a
//! bug to fix here.
//!
//! The projections ([`line_subtotal`], [`cart_total`], [`discount_percent`])
//! are pure and carry no cached state; callers recompute them on every read.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// One product instance held in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Source product's document ID.
    pub id: String,
    /// Product display name.
    pub name: String,
    /// Unit price in the store currency. Non-negative.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Pre-discount price, when the product is on sale.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "originalPrice",
        with = "rust_decimal::serde::float_option"
    )]
    pub original_price: Option<Decimal>,
    /// Product image URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Units of this line. Defaults to 1 when absent in stored documents.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Selected size, if the user picked one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Selected color, if the user picked one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Price times quantity for this line.
    #[must_use]
    pub fn line_subtotal(&self) -> Decimal {
        line_subtotal(self.price, self.quantity)
    }

    /// Rounded percentage saved versus the original price, when present.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        self.original_price
            .and_then(|original| discount_percent(self.price, original))
    }
}

/// One product instance held in a wishlist.
///
/// Wishlists carry no quantity, size, or color; those are chosen when the
/// item moves to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Source product's document ID.
    pub id: String,
    /// Product display name.
    pub name: String,
    /// Unit price in the store currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Pre-discount price, when the product is on sale.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "originalPrice",
        with = "rust_decimal::serde::float_option"
    )]
    pub original_price: Option<Decimal>,
    /// Product image URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl WishlistItem {
    /// Rounded percentage saved versus the original price, when present.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        self.original_price
            .and_then(|original| discount_percent(self.price, original))
    }

    /// Convert to a cart line with quantity 1 and no size/color selection.
    #[must_use]
    pub fn into_cart_item(self) -> CartItem {
        CartItem {
            id: self.id,
            name: self.name,
            price: self.price,
            original_price: self.original_price,
            image: self.image,
            quantity: 1,
            size: None,
            color: None,
        }
    }
}

/// Price times quantity for a single line.
#[must_use]
pub fn line_subtotal(price: Decimal, quantity: u32) -> Decimal {
    price * Decimal::from(quantity)
}

/// Sum of line subtotals over a cart. Empty carts total zero.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_subtotal).sum()
}

/// Percentage saved versus `original`, rounded half-away-from-zero.
///
/// Returns `None` when `original` is not positive, where the percentage is
/// undefined.
#[must_use]
pub fn discount_percent(price: Decimal, original: Decimal) -> Option<u32> {
    if original <= Decimal::ZERO {
        return None;
    }

    let percent = (original - price) / original * Decimal::from(100);
    percent
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(id: &str, price: Decimal, quantity: u32) -> CartItem {
        CartItem {
            id: id.to_owned(),
            name: format!("Product {id}"),
            price,
            original_price: None,
            image: None,
            quantity,
            size: None,
            color: None,
        }
    }

    #[test]
    fn test_line_subtotal() {
        assert_eq!(line_subtotal(d("9.99"), 3), d("29.97"));
        assert_eq!(line_subtotal(d("9.99"), 1), d("9.99"));
    }

    #[test]
    fn test_cart_total_sums_lines() {
        let items = vec![item("a", d("10.00"), 2), item("b", d("5.50"), 1)];
        assert_eq!(cart_total(&items), d("25.50"));
    }

    #[test]
    fn test_cart_total_empty_is_zero() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_discount_percent_eighty_of_hundred() {
        assert_eq!(discount_percent(d("80"), d("100")), Some(20));
    }

    #[test]
    fn test_discount_percent_rounds_half_up() {
        // 33.5% saved rounds to 34, not banker's 34-or-33
        assert_eq!(discount_percent(d("66.50"), d("100")), Some(34));
    }

    #[test]
    fn test_discount_percent_undefined_for_zero_original() {
        assert_eq!(discount_percent(d("80"), Decimal::ZERO), None);
    }

    #[test]
    fn test_quantity_defaults_to_one_on_deserialize() {
        let json = r#"{"id":"1","name":"Wireless Headphones","price":99.99}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.line_subtotal(), d("99.99"));
    }

    #[test]
    fn test_cart_item_serde_roundtrip_keeps_selection() {
        let item = CartItem {
            id: "3".to_owned(),
            name: "Running Shoes".to_owned(),
            price: d("79.99"),
            original_price: Some(d("99.99")),
            image: Some("/products/shoes.jpg".to_owned()),
            quantity: 2,
            size: Some("M".to_owned()),
            color: Some("Black".to_owned()),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["originalPrice"], serde_json::json!(99.99));
        let back: CartItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_wishlist_item_into_cart_item() {
        let wished = WishlistItem {
            id: "5".to_owned(),
            name: "Leather Wallet".to_owned(),
            price: d("39.99"),
            original_price: None,
            image: None,
        };
        let cart_item = wished.into_cart_item();
        assert_eq!(cart_item.quantity, 1);
        assert_eq!(cart_item.size, None);
        assert_eq!(cart_item.id, "5");
    }
}
