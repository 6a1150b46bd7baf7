//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. Security headers (reads the nonce back from the response)
//! 5. CSP nonce
//! 6. Session layer (tower-sessions)
//! 7. Tenant resolution (Host header to shop)
//! 8. Session expiry (drops identity after a backend 401)
//! 9. Visit tracking
//!
//! Auth routes additionally sit behind the rate limiter.

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod tenant;
pub mod visit;

pub use auth::{
    OptionalAuth, RequireAuth, clear_current_customer, session_expiry_middleware,
    set_current_customer,
};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use tenant::{CurrentShop, tenant_middleware};
pub use visit::visit_tracking_middleware;
