//! Session middleware configuration.
//!
//! Production uses the `PostgreSQL` store from `tower-sessions-sqlx-store`;
//! tests plug in `MemoryStore`.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bazaar_session";

/// Session expiry time in seconds (14 days of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 14 * 24 * 60 * 60;

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer<Store>(
    store: Store,
    config: &StorefrontConfig,
) -> SessionManagerLayer<Store>
where
    Store: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
