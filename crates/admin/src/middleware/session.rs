//! Session middleware configuration for admin.
//!
//! Stricter than the storefront: `SameSite=Strict` and a 24 hour inactivity
//! expiry. Production uses the `PostgreSQL` store; tests plug in
//! `MemoryStore`.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "bazaar_admin_session";

/// Session expiry time in seconds (24 hours - stricter than storefront).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<Store>(store: Store, config: &AdminConfig) -> SessionManagerLayer<Store>
where
    Store: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        // SameSite=Strict for admin (stricter than storefront's Lax)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
