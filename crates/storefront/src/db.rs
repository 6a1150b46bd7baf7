//! Session database connection.
//!
//! The storefront keeps no business data of its own: the commerce backend is
//! the source of truth. `PostgreSQL` only backs the `tower_sessions` table,
//! whose migration is applied with `bazaar migrate storefront`.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create the session store pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
