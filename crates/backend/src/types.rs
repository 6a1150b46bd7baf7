//! Request and response shapes that only exist on the wire.
//!
//! Domain records (products, orders, tickets, ...) live in `bazaar-core`;
//! this module holds the envelopes and payloads around them.

use bazaar_core::catalog::{DEFAULT_LOW_STOCK_THRESHOLD, StockStatus};
use bazaar_core::order::{Order, OrderStatus};
use bazaar_core::pagination::Pagination;
use bazaar_core::support::TicketStatus;
use bazaar_core::{OrderId, ProductId, ShopId, UserId, UserRole, VariantId, VisitId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const fn first_page() -> u32 {
    1
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(alias = "data")]
    pub items: Vec<T>,
    #[serde(default = "first_page", alias = "current_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default, alias = "total_items")]
    pub total: u64,
    #[serde(default)]
    pub last_page: Option<u32>,
}

impl<T> Paginated<T> {
    /// A page holding every item, for endpoints that return bare arrays.
    #[must_use]
    pub fn single(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        let per_page = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self {
            items,
            page: 1,
            per_page,
            total,
            last_page: Some(1),
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::single(Vec::new())
    }

    /// Whether the backend has pages after this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        match self.last_page {
            Some(last) => self.page < last,
            None => {
                let per_page = if self.per_page == 0 {
                    self.items.len() as u64
                } else {
                    u64::from(self.per_page)
                };
                per_page > 0 && u64::from(self.page) * per_page < self.total
            }
        }
    }

    /// Paging controls, using `fallback_per_page` when the backend omits it.
    #[must_use]
    pub fn pagination(&self, fallback_per_page: u32) -> Pagination {
        let per_page = if self.per_page == 0 {
            fallback_per_page
        } else {
            self.per_page
        };
        Pagination::new(self.page, per_page, self.total)
    }
}

/// Either a bare array or a page, normalized to a page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    List(Vec<T>),
    Page(Paginated<T>),
}

impl<T> Listing<T> {
    pub(crate) fn into_page(self) -> Paginated<T> {
        match self {
            Self::List(items) => Paginated::single(items),
            Self::Page(mut page) => {
                page.total = page.total.max(page.items.len() as u64);
                page
            }
        }
    }

    pub(crate) fn into_vec(self) -> Vec<T> {
        self.into_page().items
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub shop_id: ShopId,
}

/// Account behind a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(alias = "user_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub shop_id: Option<ShopId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "access_token")]
    pub token: String,
    pub user: AuthUser,
}

// =============================================================================
// Analytics
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VisitStart {
    pub shop_id: ShopId,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VisitStarted {
    #[serde(alias = "id")]
    pub visit_id: VisitId,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitUpdate {
    pub visit_id: VisitId,
    pub path: String,
    pub seconds_on_site: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VisitConversion {
    pub visit_id: VisitId,
    pub order_id: OrderId,
}

// =============================================================================
// Merchant
// =============================================================================

/// Numbers on the merchant dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSummary {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub total_revenue: Decimal,
    pub total_products: u64,
    pub low_stock_count: u64,
    pub open_tickets: u64,
    pub recent_orders: Vec<Order>,
}

/// One row of the inventory screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock_qty: i64,
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
}

impl InventoryItem {
    #[must_use]
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_quantity(
            self.stock_qty,
            self.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
        )
    }
}

/// Filters for the merchant order list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub page: u32,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub(crate) fn params(self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.max(1).to_string())];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StockUpdate {
    pub stock_qty: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TicketStatusUpdate {
    pub status: TicketStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_aliases_and_has_more() {
        let page: Paginated<u32> = serde_json::from_str(
            r#"{"data": [1, 2], "current_page": 1, "per_page": 2, "total": 5}"#,
        )
        .unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_more());
        assert_eq!(page.pagination(10).total_pages(), 3);

        let last: Paginated<u32> = serde_json::from_str(
            r#"{"items": [5], "page": 3, "per_page": 2, "total": 5}"#,
        )
        .unwrap();
        assert!(!last.has_more());
    }

    #[test]
    fn test_order_page_survives_unfamiliar_statuses() {
        let page: Paginated<Order> = serde_json::from_str(
            r#"{"items": [
                {"id": 1, "status": "Delivered", "total": "10.00"},
                {"id": 2, "status": "returned", "total": "4.00"}
            ], "total": 2}"#,
        )
        .unwrap();
        let statuses: Vec<OrderStatus> = page.items.iter().map(|o| o.status).collect();
        assert_eq!(statuses, vec![OrderStatus::Delivered, OrderStatus::Open]);
    }

    #[test]
    fn test_last_page_wins_over_totals() {
        let page: Paginated<u32> =
            serde_json::from_str(r#"{"items": [], "page": 2, "last_page": 4}"#).unwrap();
        assert!(page.has_more());
    }

    #[test]
    fn test_listing_accepts_array_or_page() {
        let list: Listing<u32> = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(list.into_page().total, 3);
        let page: Listing<u32> = serde_json::from_str(r#"{"items": [4], "total": 9}"#).unwrap();
        assert_eq!(page.into_page().total, 9);
    }

    #[test]
    fn test_missing_per_page_uses_fallback() {
        let page: Paginated<u32> = serde_json::from_str(r#"{"items": [], "total": 30}"#).unwrap();
        assert_eq!(page.pagination(12).total_pages(), 3);
        assert!(!Paginated::<u32>::empty().has_more());
    }
}
