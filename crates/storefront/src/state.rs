//! Application state shared across handlers.

use std::sync::Arc;

use bazaar_backend::BackendClient;
use bazaar_core::shop::{Shop, ShopRegistry};
use sqlx::PgPool;

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The backend client carries the catalog
/// cache, so every clone sees the same cached entries.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    shops: ShopRegistry,
    pool: Option<PgPool>,
}

impl AppState {
    #[must_use]
    pub fn new(config: StorefrontConfig, backend: BackendClient, shops: ShopRegistry) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                shops,
                pool: None,
            }),
        }
    }

    /// State backed by the session database, which readiness checks probe.
    #[must_use]
    pub fn with_pool(
        config: StorefrontConfig,
        backend: BackendClient,
        shops: ShopRegistry,
        pool: PgPool,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                shops,
                pool: Some(pool),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Client for the commerce backend.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn shops(&self) -> &ShopRegistry {
        &self.inner.shops
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Shop serving a `Host` header value.
    #[must_use]
    pub fn shop_for_host(&self, host: Option<&str>) -> &Shop {
        self.inner.shops.resolve(host)
    }
}
