//! Review submission and the purchase check in front of it.

use bazaar_core::catalog::Product;
use bazaar_core::review::{EligibilityScan, ReviewEligibilityError, ReviewSubmission};
use bazaar_core::{OrderId, ShopId};
use reqwest::Method;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::client::BackendClient;
use crate::error::ApiError;

/// Why a shopper cannot review a product right now.
#[derive(Debug, Error)]
pub enum EligibilityError {
    #[error(transparent)]
    Ineligible(#[from] ReviewEligibilityError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl BackendClient {
    /// Find the delivered order that lets the signed-in shopper review
    /// `product`.
    ///
    /// Reads at most five pages of order history, one request at a time,
    /// stopping early on the last page.
    ///
    /// # Errors
    ///
    /// [`EligibilityError::Ineligible`] when no delivered order contains the
    /// product, [`EligibilityError::Api`] when a page cannot be fetched.
    #[instrument(skip(self, token, product), fields(product = %product.id))]
    pub async fn check_review_eligibility(
        &self,
        token: &str,
        product: &Product,
    ) -> Result<OrderId, EligibilityError> {
        let mut scan = EligibilityScan::new(product.id, product.variant_ids());
        while let Some(page) = scan.next_page() {
            let orders = self.my_orders(token, page).await?;
            scan.scan_page(&orders.items, orders.has_more());
        }
        debug!(pages = scan.pages_scanned(), "Eligibility scan finished");
        Ok(scan.outcome()?)
    }

    /// Submit a review. It stays pending until a superadmin approves it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the backend rejects the review.
    #[instrument(skip(self, token, review), fields(shop = %shop, product = %product.id))]
    pub async fn submit_review(
        &self,
        token: &str,
        shop: ShopId,
        product: &Product,
        review: &ReviewSubmission,
    ) -> Result<(), ApiError> {
        self.send(
            Method::POST,
            &format!("/api/public/shops/{shop}/products/{}/reviews", product.id),
            Some(token),
            Some(review),
        )
        .await?;
        self.invalidate_product(shop, product.id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::Query;
    use axum::routing::get;
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::serve;

    fn product(id: i64) -> Product {
        serde_json::from_value(json!({
            "id": id,
            "name": "Tee",
            "price": "10.00",
            "variants": [{"id": 700, "sku": "TEE-BLUCOLMSIZ", "stock_qty": 3}]
        }))
        .unwrap()
    }

    fn order(id: i64, status: &str, product: i64, date: &str) -> Value {
        json!({
            "id": id,
            "status": status,
            "created_at": date,
            "items": [{"product_id": product, "name": "Tee", "quantity": 1, "unit_price": "10.00"}]
        })
    }

    /// Fake order history: `pages[n]` is page n+1; records requested pages.
    fn history(pages: Vec<Vec<Value>>, requested: Arc<Mutex<Vec<u32>>>) -> Router {
        let last_page = u32::try_from(pages.len()).unwrap();
        let pages = Arc::new(pages);
        Router::new().route(
            "/api/orders/user",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let pages = Arc::clone(&pages);
                let requested = Arc::clone(&requested);
                async move {
                    let page: u32 = params.get("page").unwrap().parse().unwrap();
                    requested.lock().unwrap().push(page);
                    let items = pages
                        .get(usize::try_from(page).unwrap() - 1)
                        .cloned()
                        .unwrap_or_default();
                    axum::Json(json!({
                        "data": items,
                        "page": page,
                        "last_page": last_page,
                    }))
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_finds_delivered_order_on_later_page() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let client = serve(history(
            vec![
                vec![order(1, "shipped", 42, "2024-05-01T00:00:00Z")],
                vec![order(2, "delivered", 42, "2024-04-01T00:00:00Z")],
                vec![order(3, "delivered", 42, "2024-04-20T00:00:00Z")],
            ],
            Arc::clone(&requested),
        ))
        .await;

        let order = client
            .check_review_eligibility("tok", &product(42))
            .await
            .unwrap();
        assert_eq!(order, OrderId::new(3));
        assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_variant_purchase_counts() {
        let client = serve(history(
            vec![vec![order(9, "delivered", 700, "2024-01-01T00:00:00Z")]],
            Arc::new(Mutex::new(Vec::new())),
        ))
        .await;
        let order = client
            .check_review_eligibility("tok", &product(42))
            .await
            .unwrap();
        assert_eq!(order, OrderId::new(9));
    }

    #[tokio::test]
    async fn test_gives_up_after_five_pages() {
        let requested = Arc::new(Mutex::new(Vec::new()));
        let pages = (0..8)
            .map(|i| vec![order(i, "open", 42, "2024-01-01T00:00:00Z")])
            .collect();
        let client = serve(history(pages, Arc::clone(&requested))).await;

        let err = client
            .check_review_eligibility("tok", &product(42))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EligibilityError::Ineligible(ReviewEligibilityError::NoDeliveredOrder)
        ));
        assert_eq!(
            err.to_string(),
            "You can only review products from a delivered order"
        );
        assert_eq!(requested.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_unauthorized_history_is_an_api_error() {
        let client = serve(Router::new().route(
            "/api/orders/user",
            get(|| async { axum::http::StatusCode::UNAUTHORIZED }),
        ))
        .await;
        let err = client
            .check_review_eligibility("expired", &product(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EligibilityError::Api(ApiError::Unauthorized)));
    }
}
