//! Dashboard route handler.

use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use bazaar_backend::{ApiError, DashboardSummary};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::routes::orders::OrderRow;
use crate::state::AppState;
use crate::views::{AdminUserView, format_money, take_flash};

/// Summary cards.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub revenue: String,
    pub total_products: u64,
    pub low_stock_count: u64,
    pub open_tickets: u64,
}

impl From<&DashboardSummary> for DashboardMetrics {
    fn from(summary: &DashboardSummary) -> Self {
        Self {
            total_orders: summary.total_orders,
            pending_orders: summary.pending_orders,
            revenue: format_money(summary.total_revenue),
            total_products: summary.total_products,
            low_stock_count: summary.low_stock_count,
            open_tickets: summary.open_tickets,
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<OrderRow>,
    pub error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// Shop overview. Platform-only accounts have no shop and land on the
/// superadmin screens instead.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response> {
    if admin.shop_id.is_none() {
        return Ok(Redirect::to(admin.home_path()).into_response());
    }

    let (summary, error) = match state.backend().dashboard_summary(admin.token()).await {
        Ok(summary) => (summary, None),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!("Failed to fetch dashboard summary: {e}");
            (
                DashboardSummary::default(),
                Some("The dashboard figures could not be loaded.".to_string()),
            )
        }
    };

    let template = DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        flash: take_flash(&session).await,
        metrics: DashboardMetrics::from(&summary),
        recent_orders: summary.recent_orders.iter().map(OrderRow::from).collect(),
        error,
    };

    Ok(Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_metrics_from_summary() {
        let summary = DashboardSummary {
            total_orders: 12,
            pending_orders: 3,
            total_revenue: Decimal::new(12345, 1),
            ..DashboardSummary::default()
        };
        let metrics = DashboardMetrics::from(&summary);
        assert_eq!(metrics.revenue, "1234.50");
        assert_eq!(metrics.pending_orders, 3);
    }
}
