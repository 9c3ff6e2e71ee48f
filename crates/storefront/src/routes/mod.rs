//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (Storefront API reachable)
//!
//! # Catalog
//! GET  /products                  - Product listing (?after=&sort=)
//! GET  /products/{handle}         - Product detail (?<Option>=<value> selects a variant)
//! GET  /collections               - Collection listing
//! GET  /collections/{handle}      - Collection detail (?after=)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update               - Update quantity, 0 removes (returns cart_items fragment)
//! POST /cart/remove               - Remove line (returns cart_items fragment)
//! POST /cart/discount             - Apply or clear a discount code
//! POST /cart/note                 - Update the cart note
//! GET  /cart/count                - Cart count badge (fragment)
//! GET  /checkout                  - Redirect to Shopify checkout
//!
//! # Search
//! GET  /search                    - Full search (?q=&after=)
//! GET  /search/suggest            - Predictive search fragment (?q=&limit=)
//!
//! # Compare
//! GET  /compare                   - Comparison table (?handles=a,b)
//! POST /compare/add               - Add a product to the compare list
//! POST /compare/remove            - Remove a product from the compare list
//! POST /compare/clear             - Empty the compare list
//!
//! # Content
//! GET  /pages/{handle}            - Content page
//! GET  /policies                  - Policy index
//! GET  /policies/{handle}         - Policy page
//!
//! # Customer login (rate limited)
//! GET  /account/login             - Start Customer Account OAuth
//! GET  /account/authorize         - OAuth callback
//! POST /account/logout            - Sign out
//!
//! # Account (requires customer)
//! GET  /account                   - Redirect to orders
//! GET  /account/orders            - Order history
//! GET  /account/orders/{id}       - Order detail
//! GET  /account/addresses         - Address book
//! POST /account/addresses         - Create address
//! POST /account/addresses/{id}    - Update address
//! POST /account/addresses/{id}/delete - Delete address
//! GET  /account/profile           - Profile form
//! POST /account/profile           - Update profile
//! GET  /account/{*rest}           - Redirect to /account
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod collections;
pub mod compare;
pub mod health;
pub mod home;
pub mod pages;
pub mod policies;
pub mod products;
pub mod search;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;

use crate::middleware::auth_rate_limiter;
use crate::shopify::PageInfo;
use crate::state::AppState;

/// Default page size for product grids.
pub const PAGE_SIZE: i64 = 24;

/// Cursor pagination query parameters (`?after=`).
#[derive(Debug, Default, Deserialize)]
pub struct CursorQuery {
    pub after: Option<String>,
}

impl CursorQuery {
    /// The cursor, ignoring empty values.
    #[must_use]
    pub fn cursor(&self) -> Option<String> {
        self.after.clone().filter(|c| !c.is_empty())
    }
}

/// Cursor of the next page, URL-encoded for `?after=` links.
#[must_use]
pub fn next_page(page_info: &PageInfo) -> Option<String> {
    page_info
        .next_cursor()
        .map(|cursor| urlencoding::encode(cursor).into_owned())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{handle}", get(products::show))
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index))
        .route("/{handle}", get(collections::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/discount", post(cart::discount))
        .route("/note", post(cart::note))
        .route("/count", get(cart::count))
}

/// Create the search routes router.
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search::index))
        .route("/suggest", get(search::suggest))
}

/// Create the compare routes router.
pub fn compare_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(compare::show))
        .route("/add", post(compare::add))
        .route("/remove", post(compare::remove))
        .route("/clear", post(compare::clear))
}

/// Create the policy routes router.
pub fn policy_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(policies::index))
        .route("/{handle}", get(policies::show))
}

/// Customer login routes, rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/authorize", get(auth::authorize))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
        .route(
            "/profile",
            get(account::profile).post(account::update_profile),
        )
        .route("/{*rest}", get(account::fallback))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Health checks
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        // Catalog
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        // Cart
        .nest("/cart", cart_routes())
        .route("/checkout", get(cart::checkout))
        // Search and compare
        .nest("/search", search_routes())
        .nest("/compare", compare_routes())
        // Content
        .route("/pages/{handle}", get(pages::show))
        .nest("/policies", policy_routes())
        // Customer accounts; login routes are matched before the catch-all
        .nest("/account", auth_routes().merge(account_routes()))
}
