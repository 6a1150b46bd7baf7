//! Session database connection for the back office.
//!
//! Staff accounts, shops and orders all live in the commerce backend; this
//! pool only backs the `tower_sessions` table. Apply its migration with:
//! ```bash
//! cargo run -p bazaar-cli -- migrate admin
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create the session store pool. The back office has few users, so the
/// pool stays small.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
