//! Visit tracking for the shop's analytics.
//!
//! The first page view of a shop in a session starts a visit on the backend
//! and keeps its id in the session. Later page views report the path and time
//! on site from a spawned task, so the page never waits for analytics.

use axum::{
    extract::{Request, State},
    http::{
        Method,
        header::{REFERER, USER_AGENT},
    },
    middleware::Next,
    response::Response,
};
use bazaar_backend::{VisitConversion, VisitStart, VisitUpdate};
use bazaar_core::{OrderId, ShopId};
use chrono::Utc;
use tower_sessions::Session;
use tracing::Instrument;

use super::tenant::CurrentShop;
use crate::models::{VisitState, session_keys};
use crate::state::AppState;

/// Paths that are not page views.
const UNTRACKED_PREFIXES: &[&str] = &["/static/", "/health", "/cart/count", "/favicon"];

fn is_page_view(request: &Request) -> bool {
    let path = request.uri().path();
    request.method() == Method::GET
        && !UNTRACKED_PREFIXES.iter().any(|p| path.starts_with(p))
        && !request.headers().contains_key("hx-request")
}

/// Payload opening a visit, with owned copies of the request headers.
fn visit_start(request: &Request, shop_id: ShopId, path: String) -> VisitStart {
    let header = |name| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    VisitStart {
        shop_id,
        path,
        referrer: header(REFERER),
        user_agent: header(USER_AGENT),
    }
}

/// Start or extend the analytics visit of the current shop.
pub async fn visit_tracking_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if !is_page_view(&request) {
        return next.run(request).await;
    }
    let Some(CurrentShop(shop)) = request.extensions().get::<CurrentShop>().cloned() else {
        return next.run(request).await;
    };

    let key = session_keys::visit(&shop.slug);
    let path = request.uri().path().to_string();
    let existing = session.get::<VisitState>(&key).await.ok().flatten();

    match existing {
        Some(
            visit @ VisitState {
                visit_id: Some(visit_id),
                ..
            },
        ) => {
            let update = VisitUpdate {
                visit_id,
                path,
                seconds_on_site: visit.seconds_on_site(Utc::now()),
            };
            let backend = state.backend().clone();
            tokio::spawn(
                async move {
                    if let Err(e) = backend.update_visit(&update).await {
                        tracing::debug!(error = %e, "Visit update failed");
                    }
                }
                .in_current_span(),
            );
        }
        Some(_) => {}
        None => {
            let start = visit_start(&request, shop.id, path);
            let visit_id = match state.backend().track_visit(&start).await {
                Ok(started) => Some(started.visit_id),
                Err(e) => {
                    tracing::warn!(error = %e, shop = %shop.slug, "Could not start visit");
                    None
                }
            };
            let visit = VisitState {
                visit_id,
                started_at: Utc::now(),
            };
            if let Err(e) = session.insert(&key, visit).await {
                tracing::warn!(error = %e, "Failed to store visit in session");
            }
        }
    }

    next.run(request).await
}

/// Report a placed order against the shop's visit, without waiting.
pub async fn mark_converted(state: &AppState, session: &Session, shop_slug: &str, order: OrderId) {
    let visit = session
        .get::<VisitState>(&session_keys::visit(shop_slug))
        .await
        .ok()
        .flatten();
    let Some(visit_id) = visit.and_then(|v| v.visit_id) else {
        return;
    };
    let backend = state.backend().clone();
    tokio::spawn(
        async move {
            let conversion = VisitConversion {
                visit_id,
                order_id: order,
            };
            if let Err(e) = backend.mark_converted(conversion).await {
                tracing::warn!(error = %e, "Failed to mark visit converted");
            }
        }
        .in_current_span(),
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(method: Method, path: &str) -> Request {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_page_views() {
        assert!(is_page_view(&request(Method::GET, "/products/4")));
        assert!(!is_page_view(&request(Method::POST, "/cart/add")));
        assert!(!is_page_view(&request(Method::GET, "/static/css/main.css")));
        assert!(!is_page_view(&request(Method::GET, "/cart/count")));
    }

    #[test]
    fn test_visit_start_copies_headers() {
        let request = Request::builder()
            .uri("/products/4")
            .header(REFERER, "https://news.example/")
            .body(Body::empty())
            .unwrap();
        let start = visit_start(&request, ShopId::new(1), "/products/4".to_string());
        assert_eq!(start.shop_id, ShopId::new(1));
        assert_eq!(start.referrer.as_deref(), Some("https://news.example/"));
        assert_eq!(start.user_agent, None);
    }

    /// Type-checks only: the middleware future must be `Send` to serve.
    #[test]
    fn test_middleware_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}
        #[allow(dead_code)]
        fn check(state: AppState, session: Session, request: Request, next: Next) {
            assert_send(&visit_tracking_middleware(State(state), session, request, next));
        }
    }
}
