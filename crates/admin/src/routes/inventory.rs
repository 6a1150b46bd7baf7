//! Inventory route handlers: stock levels with a low-stock filter.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use bazaar_backend::{ApiError, InventoryItem, Paginated, StockUpdate};
use bazaar_core::{ProductId, VariantId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireMerchant;
use crate::state::AppState;
use crate::views::{AdminUserView, Pager, flash, take_flash};

const ITEMS_PER_PAGE: u32 = 25;

/// Highest stock level accepted from the form.
const MAX_STOCK: i64 = 1_000_000;

/// Inventory row for templates.
#[derive(Debug, Clone)]
pub struct InventoryRow {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub sku: String,
    pub stock_qty: i64,
    pub stock_label: String,
    pub stock_class: &'static str,
}

impl From<&InventoryItem> for InventoryRow {
    fn from(item: &InventoryItem) -> Self {
        let status = item.stock_status();
        Self {
            product_id: item.product_id.to_string(),
            variant_id: item.variant_id.map(|v| v.to_string()),
            name: item.name.clone(),
            sku: item.sku.clone().unwrap_or_default(),
            stock_qty: item.stock_qty,
            stock_label: status.label(),
            stock_class: status.badge_class(),
        }
    }
}

/// Inventory page template.
#[derive(Template)]
#[template(path = "inventory.html")]
pub struct InventoryIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub items: Vec<InventoryRow>,
    pub low_stock_only: bool,
    pub page: u32,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Query parameters for inventory listing.
#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    pub low_stock: Option<String>,
    pub page: Option<u32>,
}

impl InventoryQuery {
    fn low_stock_only(&self) -> bool {
        self.low_stock
            .as_deref()
            .is_some_and(|v| matches!(v, "1" | "true" | "on"))
    }
}

fn inventory_href(low_stock_only: bool, page: u32) -> String {
    if low_stock_only {
        format!("/inventory?low_stock=1&page={page}")
    } else {
        format!("/inventory?page={page}")
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(index))
        .route("/inventory/{id}/stock", post(set_stock))
}

/// Inventory listing page handler.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<InventoryQuery>,
) -> Result<Html<String>> {
    let low_stock_only = query.low_stock_only();
    let requested = query.page.unwrap_or(1).max(1);

    let (listing, error) = match state
        .backend()
        .inventory(admin.token(), low_stock_only, requested)
        .await
    {
        Ok(listing) => (listing, None),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!("Failed to fetch inventory: {e}");
            (
                Paginated::empty(),
                Some("Inventory could not be loaded right now.".to_string()),
            )
        }
    };

    let pagination = listing.pagination(ITEMS_PER_PAGE);
    let template = InventoryIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/inventory".to_string(),
        flash: take_flash(&session).await,
        items: listing.items.iter().map(InventoryRow::from).collect(),
        low_stock_only,
        page: pagination.page(),
        pager: Pager::new(&pagination, |n| inventory_href(low_stock_only, n)),
        error,
    };

    Ok(Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    })))
}

/// Form for setting a stock level.
#[derive(Debug, Deserialize)]
pub struct StockForm {
    pub stock_qty: String,
    #[serde(default)]
    pub variant_id: String,
    #[serde(default)]
    pub low_stock: String,
    #[serde(default)]
    pub page: Option<u32>,
}

impl StockForm {
    fn update(&self) -> std::result::Result<StockUpdate, String> {
        let stock_qty = self
            .stock_qty
            .trim()
            .parse::<i64>()
            .map_err(|_| "Stock must be a whole number.".to_string())?;
        if !(0..=MAX_STOCK).contains(&stock_qty) {
            return Err(format!("Stock must be between 0 and {MAX_STOCK}."));
        }
        let variant_id = match self.variant_id.trim() {
            "" => None,
            raw => Some(
                raw.parse::<VariantId>()
                    .map_err(|_| "Unknown variant.".to_string())?,
            ),
        };
        Ok(StockUpdate {
            stock_qty,
            variant_id,
        })
    }

    fn back(&self) -> String {
        inventory_href(!self.low_stock.is_empty(), self.page.unwrap_or(1).max(1))
    }
}

/// Set the stock of a product or one of its variants.
#[instrument(skip(admin, state, session, form))]
pub async fn set_stock(
    RequireMerchant(admin, shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<StockForm>,
) -> Result<Redirect> {
    let back = Redirect::to(&form.back());
    let update = match form.update() {
        Ok(update) => update,
        Err(message) => {
            flash(&session, message).await;
            return Ok(back);
        }
    };

    match state
        .backend()
        .update_stock(admin.token(), id, update)
        .await
    {
        Ok(()) => {
            tracing::info!(shop = %shop, product = %id, stock = update.stock_qty, "Stock updated");
            flash(&session, format!("Stock set to {}.", update.stock_qty)).await;
        }
        Err(ApiError::Validation(message)) => flash(&session, message).await,
        Err(e) => return Err(e.into()),
    }
    Ok(back)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(qty: &str, variant: &str) -> StockForm {
        StockForm {
            stock_qty: qty.to_string(),
            variant_id: variant.to_string(),
            low_stock: "1".to_string(),
            page: Some(3),
        }
    }

    #[test]
    fn test_stock_form_parsing() {
        let update = form(" 12 ", "").update().unwrap();
        assert_eq!(update.stock_qty, 12);
        assert_eq!(update.variant_id, None);

        let variant = form("0", "77").update().unwrap();
        assert_eq!(variant.variant_id, Some(VariantId::new(77)));

        assert!(form("-1", "").update().is_err());
        assert!(form("lots", "").update().is_err());
        assert!(form("3", "abc").update().is_err());
    }

    #[test]
    fn test_back_keeps_low_stock_filter() {
        assert_eq!(form("1", "").back(), "/inventory?low_stock=1&page=3");
        let plain = StockForm {
            low_stock: String::new(),
            page: None,
            ..form("1", "")
        };
        assert_eq!(plain.back(), "/inventory?page=1");
    }

    #[test]
    fn test_low_stock_query_flag() {
        let on = InventoryQuery {
            low_stock: Some("1".to_string()),
            page: None,
        };
        assert!(on.low_stock_only());
        assert!(!InventoryQuery::default().low_stock_only());
    }

    #[test]
    fn test_row_badges() {
        let item: InventoryItem = serde_json::from_value(serde_json::json!({
            "product_id": 5,
            "name": "Mug",
            "stock_qty": 2,
            "low_stock_threshold": 3
        }))
        .unwrap();
        let row = InventoryRow::from(&item);
        assert_eq!(row.stock_label, "Only 2 left");
        assert_eq!(row.sku, "");
    }
}
