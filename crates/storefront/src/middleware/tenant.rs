//! Tenant resolution: which shop a request is for.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Uri, header::HOST, request::Parts},
    middleware::Next,
    response::Response,
};
use bazaar_core::shop::Shop;
use tracing::Span;

use crate::state::AppState;

/// The shop serving the current request.
#[derive(Debug, Clone)]
pub struct CurrentShop(pub Shop);

/// Host the browser asked for, from the `Host` header or the URI authority
/// (HTTP/2).
fn request_host(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(String::from)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
}

/// Resolve the shop from the host and store it in request extensions.
pub async fn tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let host = request_host(request.headers(), request.uri());
    let shop = state.shop_for_host(host.as_deref()).clone();

    Span::current().record("shop", shop.slug.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("shop", &shop.slug);
    });

    request.extensions_mut().insert(CurrentShop(shop));
    next.run(request).await
}

impl FromRequestParts<AppState> for CurrentShop {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(shop) = parts.extensions.get::<Self>() {
            return Ok(shop.clone());
        }
        let host = request_host(&parts.headers, &parts.uri);
        Ok(Self(state.shop_for_host(host.as_deref()).clone()))
    }
}
