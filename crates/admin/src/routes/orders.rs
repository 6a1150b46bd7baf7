//! Shop orders: filtered listing and status changes.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use bazaar_backend::{ApiError, OrderFilter, Paginated, StatusUpdate};
use bazaar_core::OrderId;
use bazaar_core::order::{Order, OrderStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireMerchant;
use crate::state::AppState;
use crate::views::{
    AdminUserView, Pager, filter_param, flash, format_datetime, format_money, take_flash,
};

const ORDERS_PER_PAGE: u32 = 20;

/// A status the order may move to, for the row's select box.
#[derive(Debug, Clone)]
pub struct StatusChoice {
    pub value: &'static str,
    pub label: &'static str,
}

/// Order row for tables.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub number: String,
    pub customer: String,
    pub item_count: u32,
    pub total: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub created: String,
    pub ship_to: Option<String>,
    pub next_statuses: Vec<StatusChoice>,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            number: order.display_number(),
            customer: order
                .customer_name
                .clone()
                .or_else(|| order.customer_email.clone())
                .unwrap_or_else(|| "Guest".to_string()),
            item_count: order.item_count(),
            total: format_money(order.total),
            status: order.status.as_str(),
            status_label: order.status.label(),
            status_class: order.status.badge_class(),
            created: format_datetime(order.created_at),
            ship_to: order.shipping_address.as_ref().map(|a| a.one_line()),
            next_statuses: order
                .status
                .next_statuses()
                .iter()
                .map(|s| StatusChoice {
                    value: s.as_str(),
                    label: s.label(),
                })
                .collect(),
        }
    }
}

/// Status filter tab.
#[derive(Debug, Clone)]
pub struct StatusTab {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

/// Orders page template.
#[derive(Template)]
#[template(path = "orders.html")]
pub struct OrdersTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub orders: Vec<OrderRow>,
    pub tabs: Vec<StatusTab>,
    pub status_filter: String,
    pub page: u32,
    pub pager: Pager,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

impl OrdersQuery {
    fn status(&self) -> Option<OrderStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

fn status_tabs(selected: Option<OrderStatus>) -> Vec<StatusTab> {
    let all = StatusTab {
        href: "/orders".to_string(),
        label: "All",
        active: selected.is_none(),
    };
    std::iter::once(all)
        .chain(OrderStatus::ALL.into_iter().map(|s| StatusTab {
            href: format!("/orders?status={}", s.as_str()),
            label: s.label(),
            active: selected == Some(s),
        }))
        .collect()
}

fn orders_href(status: Option<&str>, page: u32) -> String {
    format!("/orders?{}page={page}", filter_param("status", status))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}/status", post(update_status))
}

/// Orders of the merchant's shop.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireMerchant(admin, shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrdersQuery>,
) -> Result<Html<String>> {
    let status = query.status();
    let filter = OrderFilter {
        page: query.page.unwrap_or(1).max(1),
        status,
    };

    let (listing, error) = match state.backend().shop_orders(admin.token(), shop, filter).await {
        Ok(listing) => (listing, None),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!("Failed to fetch orders: {e}");
            (
                Paginated::empty(),
                Some("Orders could not be loaded right now.".to_string()),
            )
        }
    };

    let pagination = listing.pagination(ORDERS_PER_PAGE);
    let status_param = status.map(OrderStatus::as_str);
    let template = OrdersTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        flash: take_flash(&session).await,
        orders: listing.items.iter().map(OrderRow::from).collect(),
        tabs: status_tabs(status),
        status_filter: status_param.unwrap_or_default().to_string(),
        page: pagination.page(),
        pager: Pager::new(&pagination, |n| orders_href(status_param, n)),
        error,
    };

    Ok(Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    })))
}

/// Status change form. `current` is the status the merchant saw.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub current: String,
    pub status: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub status_filter: String,
    #[serde(default)]
    pub page: Option<u32>,
}

impl StatusForm {
    /// The requested change, checked against the transition rules.
    fn update(&self) -> std::result::Result<StatusUpdate, String> {
        let current = self.current.parse::<OrderStatus>().map_err(|e| e.to_string())?;
        let next = self.status.parse::<OrderStatus>().map_err(|e| e.to_string())?;
        let status = current.transition(next).map_err(|e| e.to_string())?;
        Ok(StatusUpdate {
            status,
            note: Some(self.note.trim().to_string()).filter(|n| !n.is_empty()),
        })
    }

    fn back(&self) -> String {
        let filter = Some(self.status_filter.as_str()).filter(|s| !s.is_empty());
        orders_href(filter, self.page.unwrap_or(1).max(1))
    }
}

/// Move an order along its lifecycle.
#[instrument(skip(admin, state, session, form))]
pub async fn update_status(
    RequireMerchant(admin, shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
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
        .update_order_status(admin.token(), shop, id, &update)
        .await
    {
        Ok(()) => {
            tracing::info!(order = %id, status = %update.status, "Order status updated");
            flash(
                &session,
                format!("Order #{id} is now {}.", update.status.label().to_lowercase()),
            )
            .await;
        }
        Err(ApiError::Validation(message)) => flash(&session, message).await,
        Err(e) => return Err(e.into()),
    }
    Ok(back)
}
