//! Bazaar back office library.
//!
//! Merchants manage their shop here; superadmins manage accounts, platform
//! categories and review moderation. Every record lives in the commerce
//! backend: this crate holds a staff bearer token in the session and calls
//! the backend on the staff member's behalf.

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
pub const STATIC_DIR: &str = "crates/admin/static";

/// Build the back-office router with its middleware stack.
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
        .layer(axum::middleware::from_fn(
            middleware::session_expiry_middleware,
        ))
        .layer(session_layer)
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{StatusCode, header};
    use bazaar_backend::BackendClient;
    use secrecy::SecretString;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::{AdminConfig, ApiConfig};

    fn test_app() -> Router {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://localhost/unused"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            session_secret: SecretString::from("s".repeat(32)),
            api: ApiConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                timeout: Duration::from_secs(1),
            },
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        };
        let backend = BackendClient::new(&config.api.base_url, config.api.timeout).unwrap();
        let session_layer = middleware::create_session_layer(MemoryStore::default(), &config);
        app(AppState::new(config, backend), session_layer)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_carries_security_headers() {
        let response = test_app().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["x-frame-options"], "DENY");
        assert!(headers.contains_key("content-security-policy"));
        assert!(headers.contains_key(middleware::request_id::REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_ready_without_database() {
        let response = test_app().oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_pages_redirect_to_login() {
        for uri in ["/", "/orders", "/inventory", "/tickets", "/superadmin/admins"] {
            let response = test_app().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], "/auth/login", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = test_app()
            .oneshot(get("/auth/login?expired=1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("Your session has expired"));
        assert!(html.contains(r#"action="/auth/login""#));
    }
}
