//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (session database)
//!
//! # Auth (backend credentials, staff roles only)
//! GET  /auth/login                      - Login page (?expired=1 after a 401)
//! POST /auth/login                      - Login action
//! POST /auth/logout                     - Logout action
//!
//! # Merchant (account linked to a shop)
//! GET  /                                - Dashboard
//! GET  /orders                          - Orders (?status=&page=)
//! POST /orders/{id}/status              - Move an order along its lifecycle
//! GET  /inventory                       - Stock levels (?low_stock=1&page=)
//! POST /inventory/{id}/stock            - Set stock
//! GET  /categories                      - Shop categories (?edit={id})
//! POST /categories                      - Create
//! POST /categories/{id}                 - Update
//! POST /categories/{id}/delete          - Delete
//! GET  /settings                        - Shop settings
//! POST /settings                        - Save settings
//! GET  /tickets                         - Support tickets (?status=&page=)
//! GET  /tickets/{id}                    - Ticket thread
//! POST /tickets/{id}/reply              - Staff reply
//! POST /tickets/{id}/status             - Change status
//!
//! # Superadmin
//! GET  /superadmin/admins               - Back-office accounts
//! POST /superadmin/admins               - Create account
//! POST /superadmin/admins/{id}/delete   - Delete account
//! GET  /superadmin/reviews              - Moderation queue (?status=pending)
//! POST /superadmin/reviews/{id}/approve
//! POST /superadmin/reviews/{id}/reject
//! GET  /superadmin/categories           - Platform categories (same actions as /categories)
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod orders;
pub mod settings;
pub mod superadmin;
pub mod tickets;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Every back-office route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(orders::router())
        .merge(inventory::router())
        .merge(categories::router())
        .merge(settings::router())
        .merge(tickets::router())
        .merge(superadmin::router())
}
