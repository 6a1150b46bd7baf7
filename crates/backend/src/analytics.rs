//! Storefront visit tracking.

use reqwest::Method;
use tracing::instrument;

use crate::client::BackendClient;
use crate::error::ApiError;
use crate::types::{VisitConversion, VisitStart, VisitStarted, VisitUpdate};

impl BackendClient {
    /// Record the first page view of a visit.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, visit), fields(shop = %visit.shop_id))]
    pub async fn track_visit(&self, visit: &VisitStart) -> Result<VisitStarted, ApiError> {
        self.post("/api/analytics/track-visit", None, visit).await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, update), fields(visit = %update.visit_id))]
    pub async fn update_visit(&self, update: &VisitUpdate) -> Result<(), ApiError> {
        self.send(Method::POST, "/api/analytics/update-visit", None, Some(update))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(visit = %conversion.visit_id, order = %conversion.order_id))]
    pub async fn mark_converted(&self, conversion: VisitConversion) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            "/api/analytics/mark-converted",
            None,
            Some(&conversion),
        )
        .await
    }
}
