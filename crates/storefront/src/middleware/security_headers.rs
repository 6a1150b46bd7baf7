//! Security headers for every storefront response.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Build the content security policy.
///
/// Product and shop images are served from whatever CDN the backend hands
/// out, so images may come from any https origin. Inline styles need the
/// request nonce.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>) -> String {
    let style_src = nonce.map_or_else(
        || "style-src 'self'".to_string(),
        |n| format!("style-src 'self' 'nonce-{n}'"),
    );
    format!(
        "default-src 'none'; \
         script-src 'self'; \
         {style_src}; \
         font-src 'self'; \
         img-src 'self' https: data:; \
         connect-src 'self'; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin` (the visit tracker
///   reports referrers, so same-site navigation keeps them)
/// - `Content-Security-Policy` with the per-request nonce
/// - `Permissions-Policy` denying sensitive features
/// - `Cache-Control: no-store` on HTML pages, which carry cart and account state
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let is_static = request.uri().path().starts_with("/static/");
    let mut response = next.run(request).await;
    let nonce = response
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_string());
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    match HeaderValue::from_str(&content_security_policy(nonce.as_deref())) {
        Ok(policy) => {
            headers.insert(CONTENT_SECURITY_POLICY, policy);
        }
        Err(e) => tracing::warn!(error = %e, "Could not build CSP header"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), geolocation=(), microphone=(), payment=(), usb=(), \
             interest-cohort=(), browsing-topics=()",
        ),
    );

    if !is_static {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_carries_nonce() {
        let policy = content_security_policy(Some("abc123"));
        assert!(policy.contains("style-src 'self' 'nonce-abc123'"));
        assert!(policy.contains("img-src 'self' https: data:"));
        assert!(!content_security_policy(None).contains("nonce-"));
    }
}
