//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. Security headers (strict CSP, no caching)
//! 5. Session layer (tower-sessions, `SameSite=Strict`)
//! 6. Session expiry (signs out after a backend 401)
//!
//! Access control happens in the extractors of [`auth`].

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminAuthRejection, OptionalAdminAuth, RequireAdminAuth, RequireMerchant, RequireSuperAdmin,
    clear_current_admin, session_expiry_middleware, set_current_admin,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
