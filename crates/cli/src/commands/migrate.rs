//! Session-store migrations.
//!
//! Both web binaries keep their sessions in `PostgreSQL` through
//! `tower-sessions-sqlx-store`. Neither creates the table on start-up; this
//! command does.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront session database
//! - `ADMIN_DATABASE_URL` - admin session database
//!
//! Either falls back to `DATABASE_URL` when unset.

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0} (or DATABASE_URL)")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Database URL for a target, falling back to `DATABASE_URL`.
fn database_url(var: &'static str) -> Result<SecretString, MigrationError> {
    dotenvy::dotenv().ok();
    std::env::var(var)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar(var))
}

async fn migrate(label: &str, var: &'static str) -> Result<(), MigrationError> {
    let url = database_url(var)?;

    tracing::info!("Connecting to {label} database...");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(url.expose_secret())
        .await?;

    tracing::info!("Creating {label} session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("{label} migrations complete");
    Ok(())
}

/// Run storefront session-store migrations.
pub async fn storefront() -> Result<(), MigrationError> {
    migrate("storefront", "STOREFRONT_DATABASE_URL").await
}

/// Run admin session-store migrations.
pub async fn admin() -> Result<(), MigrationError> {
    migrate("admin", "ADMIN_DATABASE_URL").await
}
