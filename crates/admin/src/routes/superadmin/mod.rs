//! Platform screens reachable only by superadmins.

use axum::Router;

use crate::state::AppState;

pub mod admins;
pub mod reviews;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(admins::router())
        .merge(reviews::router())
}
