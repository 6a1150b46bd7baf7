//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Always "ok" while the process serves requests.
pub async fn health() -> &'static str {
    "ok"
}

/// 503 when the session database cannot be reached.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
        tracing::warn!(error = %e, "Admin readiness check failed");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}
