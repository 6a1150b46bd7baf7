//! Application state shared across handlers.

use std::sync::Arc;

use bazaar_backend::BackendClient;
use sqlx::PgPool;

use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: BackendClient,
    pool: Option<PgPool>,
}

impl AppState {
    /// State without a session database (tests use an in-memory store).
    #[must_use]
    pub fn new(config: AdminConfig, backend: BackendClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                pool: None,
            }),
        }
    }

    #[must_use]
    pub fn with_pool(config: AdminConfig, backend: BackendClient, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                pool: Some(pool),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Client for the commerce backend. Every call made from the back office
    /// carries the signed-in staff member's token.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
