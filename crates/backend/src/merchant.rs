//! Merchant dashboard endpoints. Every call needs a merchant token.

use bazaar_core::order::Order;
use bazaar_core::settings::ShopSettings;
use bazaar_core::support::{ReplyDraft, Ticket, TicketStatus};
use bazaar_core::{OrderId, ProductId, ShopId, TicketId};
use reqwest::Method;
use tracing::{info, instrument};

use crate::client::BackendClient;
use crate::error::ApiError;
use crate::types::{
    DashboardSummary, InventoryItem, Listing, OrderFilter, Paginated, StatusUpdate, StockUpdate,
    TicketStatusUpdate,
};

impl BackendClient {
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn dashboard_summary(&self, token: &str) -> Result<DashboardSummary, ApiError> {
        self.get("/api/merchant-dashboard/summary", &[], Some(token))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn shop_orders(
        &self,
        token: &str,
        shop: ShopId,
        filter: OrderFilter,
    ) -> Result<Paginated<Order>, ApiError> {
        Ok(self
            .get::<Listing<Order>>(
                &format!("/api/shops/{shop}/orders"),
                &filter.params(),
                Some(token),
            )
            .await?
            .into_page())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the backend refuses the
    /// transition.
    #[instrument(skip(self, token, update), fields(status = %update.status))]
    pub async fn update_order_status(
        &self,
        token: &str,
        shop: ShopId,
        order: OrderId,
        update: &StatusUpdate,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &format!("/api/shops/{shop}/orders/{order}/status"),
            Some(token),
            Some(update),
        )
        .await?;
        info!("Order status updated");
        Ok(())
    }

    /// Inventory rows, optionally only those at or below their low-stock
    /// threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn inventory(
        &self,
        token: &str,
        low_stock_only: bool,
        page: u32,
    ) -> Result<Paginated<InventoryItem>, ApiError> {
        let mut params = vec![("page", page.max(1).to_string())];
        if low_stock_only {
            params.push(("low_stock", "true".to_string()));
        }
        Ok(self
            .get::<Listing<InventoryItem>>(
                "/api/merchant-dashboard/inventory",
                &params,
                Some(token),
            )
            .await?
            .into_page())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for rejected quantities.
    #[instrument(skip(self, token), fields(product = %product, stock = update.stock_qty))]
    pub async fn update_stock(
        &self,
        token: &str,
        product: ProductId,
        update: StockUpdate,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &format!("/api/merchant-dashboard/inventory/{product}/stock"),
            Some(token),
            Some(&update),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn shop_settings(&self, token: &str) -> Result<ShopSettings, ApiError> {
        self.get("/api/merchant-dashboard/settings", &[], Some(token))
            .await
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the backend rejects a field.
    #[instrument(skip(self, token, settings))]
    pub async fn update_shop_settings(
        &self,
        token: &str,
        settings: &ShopSettings,
    ) -> Result<(), ApiError> {
        self.send(
            Method::PUT,
            "/api/merchant-dashboard/settings",
            Some(token),
            Some(settings),
        )
        .await
    }

    /// Tickets raised against the merchant's shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn merchant_tickets(
        &self,
        token: &str,
        status: Option<TicketStatus>,
        page: u32,
    ) -> Result<Paginated<Ticket>, ApiError> {
        let mut params = vec![("page", page.max(1).to_string())];
        if let Some(status) = status {
            params.push(("status", status.as_str().to_string()));
        }
        Ok(self
            .get::<Listing<Ticket>>("/api/merchant-dashboard/support/tickets", &params, Some(token))
            .await?
            .into_page())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for tickets of other shops.
    #[instrument(skip(self, token), fields(ticket = %id))]
    pub async fn merchant_ticket(&self, token: &str, id: TicketId) -> Result<Ticket, ApiError> {
        self.get(
            &format!("/api/merchant-dashboard/support/tickets/{id}"),
            &[],
            Some(token),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token, reply), fields(ticket = %id))]
    pub async fn merchant_reply(
        &self,
        token: &str,
        id: TicketId,
        reply: &ReplyDraft,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &format!("/api/merchant-dashboard/support/tickets/{id}/messages"),
            Some(token),
            Some(reply),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(ticket = %id, status = status.as_str()))]
    pub async fn set_ticket_status(
        &self,
        token: &str,
        id: TicketId,
        status: TicketStatus,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &format!("/api/merchant-dashboard/support/tickets/{id}/status"),
            Some(token),
            Some(&TicketStatusUpdate { status }),
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::Router;
    use axum::extract::{Path, RawQuery};
    use axum::routing::{get, post};
    use bazaar_core::order::OrderStatus;

    use super::*;
    use crate::testing::serve;

    #[tokio::test]
    async fn test_shop_orders_sends_status_filter() {
        let client = serve(Router::new().route(
            "/api/shops/{shop}/orders",
            get(|Path(shop): Path<i64>, RawQuery(query): RawQuery| async move {
                assert_eq!(shop, 4);
                assert_eq!(query.as_deref(), Some("page=2&status=shipped"));
                axum::Json(serde_json::json!({
                    "items": [{"id": 1, "status": "shipped"}],
                    "page": 2,
                    "per_page": 20,
                    "total": 21
                }))
            }),
        ))
        .await;

        let page = client
            .shop_orders(
                "tok",
                ShopId::new(4),
                OrderFilter {
                    page: 2,
                    status: Some(OrderStatus::Shipped),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_status_update_rejection_surfaces_message() {
        let client = serve(Router::new().route(
            "/api/shops/{shop}/orders/{order}/status",
            post(|| async {
                (
                    axum::http::StatusCode::UNPROCESSABLE_ENTITY,
                    r#"{"message": "Order already delivered"}"#,
                )
            }),
        ))
        .await;
        let err = client
            .update_order_status(
                "tok",
                ShopId::new(1),
                OrderId::new(5),
                &StatusUpdate {
                    status: OrderStatus::Cancelled,
                    note: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Order already delivered");
    }

    #[tokio::test]
    async fn test_summary_defaults_missing_fields() {
        let client = serve(Router::new().route(
            "/api/merchant-dashboard/summary",
            get(|| async { axum::Json(serde_json::json!({"data": {"total_orders": 12}})) }),
        ))
        .await;
        let summary = client.dashboard_summary("tok").await.unwrap();
        assert_eq!(summary.total_orders, 12);
        assert!(summary.recent_orders.is_empty());
    }
}
