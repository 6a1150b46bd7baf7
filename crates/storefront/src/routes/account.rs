//! Account route handlers: overview, order history and order tracking.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use bazaar_backend::ApiError;
use bazaar_core::OrderId;
use bazaar_core::order::{Order, OrderError};
use bazaar_core::shop::Shop;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CurrentShop, RequireAuth};
use crate::models::CurrentCustomer;
use crate::state::AppState;
use crate::views::{self, Page, Pager, flash};

/// Orders per page when the backend does not say.
const ORDERS_PER_PAGE: u32 = 10;
const RECENT_ORDERS: usize = 3;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

/// Order row in lists.
#[derive(Clone)]
pub struct OrderRow {
    pub href: String,
    pub number: String,
    pub date: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub item_count: u32,
    pub total: String,
}

impl OrderRow {
    fn new(order: &Order, shop: &Shop) -> Self {
        Self {
            href: format!("/account/orders/{}", order.id),
            number: order.display_number(),
            date: views::format_date(order.created_at),
            status_label: order.status.label(),
            status_class: order.status.badge_class(),
            item_count: order.item_count(),
            total: shop.format(order.total),
        }
    }
}

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub page: Page,
    pub customer: CurrentCustomer,
    /// The latest few orders.
    pub orders: Vec<OrderRow>,
    pub error: Option<String>,
}

/// Display the account overview with the latest orders.
#[instrument(skip(state, customer, shop, page), fields(shop = %shop.slug))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    CurrentShop(shop): CurrentShop,
    page: Page,
) -> Result<impl IntoResponse> {
    let (orders, error) = match state.backend().my_orders(customer.token(), 1).await {
        Ok(orders) => (
            orders
                .items
                .iter()
                .take(RECENT_ORDERS)
                .map(|o| OrderRow::new(o, &shop))
                .collect(),
            None,
        ),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch recent orders");
            (Vec::new(), Some("We could not load your orders right now.".to_string()))
        }
    };

    Ok(AccountIndexTemplate {
        page,
        customer,
        orders,
        error,
    })
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub page: Page,
    pub orders: Vec<OrderRow>,
    pub pager: Pager,
    pub error: Option<String>,
}

/// Display the paginated order history.
#[instrument(skip(state, customer, shop, page), fields(shop = %shop.slug))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    CurrentShop(shop): CurrentShop,
    page: Page,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse> {
    let requested = params.page.unwrap_or(1).max(1);
    let (listing, error) = match state.backend().my_orders(customer.token(), requested).await {
        Ok(listing) => (listing, None),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch orders");
            (
                bazaar_backend::Paginated::empty(),
                Some("We could not load your orders right now.".to_string()),
            )
        }
    };

    let pagination = listing.pagination(ORDERS_PER_PAGE);
    Ok(OrdersTemplate {
        page,
        orders: listing.items.iter().map(|o| OrderRow::new(o, &shop)).collect(),
        pager: Pager::new(&pagination, |n| format!("/account/orders?page={n}")),
        error,
    })
}

/// One purchased line on the tracking page.
#[derive(Clone)]
pub struct OrderItemView {
    pub href: String,
    pub name: String,
    pub variant_label: Option<String>,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
}

/// One step of the status timeline.
#[derive(Clone)]
pub struct TimelineView {
    pub label: &'static str,
    pub done: bool,
    pub current: bool,
    pub at: String,
}

/// Order tracking template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub page: Page,
    pub id: String,
    pub number: String,
    pub date: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub cancelled: bool,
    pub can_cancel: bool,
    pub timeline: Vec<TimelineView>,
    pub items: Vec<OrderItemView>,
    pub address: Option<String>,
    pub recipient: Option<String>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
}

/// Display an order with its status timeline.
#[instrument(skip(state, customer, shop, page), fields(shop = %shop.slug))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    CurrentShop(shop): CurrentShop,
    page: Page,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = state
        .backend()
        .my_order(customer.token(), id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                AppError::NotFound(format!("order {id}"))
            } else {
                AppError::Backend(e)
            }
        })?;

    Ok(OrderTemplate {
        page,
        id: order.id.to_string(),
        number: order.display_number(),
        date: views::format_date(order.created_at),
        status_label: order.status.label(),
        status_class: order.status.badge_class(),
        cancelled: order.status.timeline_step().is_none(),
        can_cancel: order.status.customer_can_cancel(),
        timeline: order
            .timeline()
            .into_iter()
            .map(|step| TimelineView {
                label: step.label,
                done: step.done,
                current: step.current,
                at: views::format_datetime(step.at),
            })
            .collect(),
        items: order
            .items
            .iter()
            .map(|item| OrderItemView {
                href: format!("/products/{}", item.product_id),
                name: item.name.clone(),
                variant_label: item.variant_label.clone(),
                image_url: item.image_url.clone(),
                quantity: item.quantity,
                unit_price: shop.format(item.unit_price),
                line_total: shop.format(item.line_total()),
            })
            .collect(),
        address: order.shipping_address.as_ref().map(|a| a.one_line()),
        recipient: order
            .shipping_address
            .as_ref()
            .map(|a| format!("{} · {}", a.full_name, a.phone)),
        subtotal: shop.format(order.subtotal),
        shipping: shop.format(order.shipping_fee),
        total: shop.format(order.total),
    })
}

/// Cancel an order that has not started processing.
///
/// The status is re-read first so a stale page cannot cancel a shipped
/// order; the backend enforces the same rule.
#[instrument(skip(state, customer, session))]
pub async fn cancel_order(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    session: Session,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    let back = Redirect::to(&format!("/account/orders/{id}"));
    let order = state.backend().my_order(customer.token(), id).await?;

    if !order.status.customer_can_cancel() {
        flash(&session, OrderError::NotCancellable.to_string()).await;
        return Ok(back);
    }

    match state.backend().cancel_order(customer.token(), id).await {
        Ok(()) => {
            tracing::info!(order = %id, "Order cancelled by customer");
            flash(&session, format!("Order {} was cancelled.", order.display_number())).await;
        }
        Err(ApiError::Validation(message)) => flash(&session, message).await,
        Err(e) => return Err(e.into()),
    }
    Ok(back)
}
