//! Bazaar storefront library.
//!
//! The binary in `main.rs` wires configuration and the Postgres session store
//! into [`app`]; integration tests build the same router over an in-memory
//! store and a fake backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod views;

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the storefront router with its full middleware stack.
///
/// See [`middleware`] for the layer order.
pub fn app<Store>(state: AppState, session_layer: SessionManagerLayer<Store>) -> Router
where
    Store: SessionStore + Clone,
{
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                shop = tracing::field::Empty,
                request_id = tracing::field::Empty,
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(|response: &Response<Body>, latency: Duration, span: &Span| {
            span.record("status", response.status().as_u16());
            span.record(
                "latency_ms",
                u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            );
            DefaultOnResponse::default().on_response(response, latency, span);
        });

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::visit_tracking_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware::session_expiry_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::tenant_middleware,
        ))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::csp_nonce_middleware))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(trace_layer)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
