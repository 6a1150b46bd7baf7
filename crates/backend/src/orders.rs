//! Customer order history and checkout.

use bazaar_core::OrderId;
use bazaar_core::order::{CheckoutRequest, Order};
use reqwest::Method;
use tracing::{info, instrument};

use crate::client::BackendClient;
use crate::error::ApiError;
use crate::types::{Listing, Paginated};

impl BackendClient {
    /// One page of the signed-in customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &str, page: u32) -> Result<Paginated<Order>, ApiError> {
        Ok(self
            .get::<Listing<Order>>(
                "/api/orders/user",
                &[("page", page.max(1).to_string())],
                Some(token),
            )
            .await?
            .into_page())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] when the order is not the customer's.
    #[instrument(skip(self, token), fields(order = %id))]
    pub async fn my_order(&self, token: &str, id: OrderId) -> Result<Order, ApiError> {
        self.get(&format!("/api/orders/user/{id}"), &[], Some(token))
            .await
    }

    /// Place an order. The backend re-prices and re-checks stock.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the backend rejects the order.
    #[instrument(
        skip(self, token, request),
        fields(shop = %request.shop_id, lines = request.items.len())
    )]
    pub async fn place_order(
        &self,
        token: &str,
        request: &CheckoutRequest,
    ) -> Result<Order, ApiError> {
        let order: Order = self.post("/api/orders/user", Some(token), request).await?;
        info!(order = %order.id, "Order placed");
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the order can no longer be
    /// cancelled.
    #[instrument(skip(self, token), fields(order = %id))]
    pub async fn cancel_order(&self, token: &str, id: OrderId) -> Result<(), ApiError> {
        self.send_empty(Method::POST, &format!("/api/orders/user/{id}/cancel"), Some(token))
            .await
    }
}
