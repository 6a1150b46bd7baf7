//! CSP nonce middleware.
//!
//! Each request gets a fresh nonce. Templates put it on the inline `<style>`
//! block that carries the shop's theme colors, and the security-headers
//! middleware writes the same value into the policy.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// A CSP nonce value (128-bit, base64-encoded).
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Generate a nonce and store it in request extensions.
///
/// Must run inside `security_headers_middleware` so the nonce can be copied
/// into the response's policy.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    let nonce = CspNonce::generate();
    request.extensions_mut().insert(nonce.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(nonce);
    response
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("CSP nonce missing from request extensions");
            Self(String::new())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_unique_base64() {
        let a = CspNonce::generate();
        let b = CspNonce::generate();
        assert_ne!(a.value(), b.value());
        assert_eq!(a.value().len(), 24);
    }
}
