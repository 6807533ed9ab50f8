//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Backend reachability check
//!
//! # Catalog
//! GET  /products               - Product listing (?q= search, ?category= filter)
//! GET  /products/{id}          - Product detail
//! GET  /home                   - Home carousels + featured products
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart contents, total, and count
//! POST /cart/add               - Add a line (detail-page path, no duplicate check)
//! POST /cart/quick-add         - Add a line (listing path, deduped by product id)
//! POST /cart/update            - Update quantity/size/color on a line
//! POST /cart/remove            - Remove a line
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Line count badge
//!
//! # Wishlist (requires auth)
//! GET  /wishlist               - Wishlist contents
//! POST /wishlist/add           - Add an item (deduped by product id)
//! POST /wishlist/remove        - Remove an item
//! POST /wishlist/clear         - Empty the wishlist
//! POST /wishlist/move-to-cart  - Move an item into the cart
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Order summary + saved address
//! POST /checkout               - Place the order, then empty the cart
//!
//! # Account (requires auth)
//! GET  /account/address        - Saved delivery address
//! PUT  /account/address        - Save delivery address
//!
//! # Auth
//! POST /auth/register          - Email/password sign-up
//! POST /auth/login             - Email/password sign-in
//! POST /auth/logout            - Sign out
//! POST /auth/otp/send          - Start phone OTP sign-in
//! POST /auth/otp/verify        - Complete phone OTP sign-in
//!
//! # Admin (requires auth)
//! GET    /admin/products       - List catalog products
//! POST   /admin/products       - Create a product
//! DELETE /admin/products/{id}  - Delete a product
//! POST   /admin/carousels      - Create a home carousel
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/otp/send", post(auth::send_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/quick-add", post(cart::quick_add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/clear", post(wishlist::clear))
        .route("/move-to-cart", post(wishlist::move_to_cart))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route(
        "/address",
        get(account::address).put(account::save_address),
    )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin::list_products).post(admin::create_product))
        .route("/products/{id}", delete(admin::delete_product))
        .route("/carousels", post(admin::create_carousel))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/home", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
}
