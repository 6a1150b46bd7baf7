//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hero, featured products, categories)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (session database)
//!
//! # Catalog
//! GET  /products               - Product listing (filters, price range, paging)
//! GET  /products/{id}          - Product detail (?color=Blue&size=M selects a variant)
//! POST /products/{id}/reviews  - Submit a review (delivered order required)
//! GET  /categories             - Categories and brands
//!
//! # Cart (session, per shop)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (HTMX: returns the badge fragment)
//! POST /cart/update            - Change a line quantity
//! POST /cart/remove            - Remove a line
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Shipping and payment form
//! POST /checkout               - Place the order
//!
//! # Account (requires auth)
//! GET  /account                - Account overview
//! GET  /account/orders         - Order history
//! GET  /account/orders/{id}    - Order tracking
//! POST /account/orders/{id}/cancel
//!
//! # Support (requires auth)
//! GET  /support                - Ticket list
//! GET  /support/new            - New ticket form
//! POST /support/new            - Open a ticket
//! GET  /support/{id}           - Ticket thread
//! POST /support/{id}/reply     - Reply
//! POST /support/{id}/close     - Close
//!
//! # Auth (rate limited)
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod health;
pub mod home;
pub mod products;
pub mod support;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/{id}/reviews", post(products::submit_review))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .route("/orders/{id}/cancel", post(account::cancel_order))
}

/// Create the support routes router.
pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(support::index))
        .route("/new", get(support::new_ticket_page).post(support::create))
        .route("/{id}", get(support::show))
        .route("/{id}/reply", post(support::reply))
        .route("/{id}/close", post(support::close))
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .route("/categories", get(categories::index))
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::place_order))
        .nest("/account", account_routes())
        .nest("/support", support_routes())
        .nest("/auth", auth_routes())
}
