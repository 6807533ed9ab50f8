//! Core types for Tidepool Commerce.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod item;

pub use email::{Email, EmailError};
pub use id::*;
pub use item::{CartItem, WishlistItem, cart_total, discount_percent, line_subtotal};
