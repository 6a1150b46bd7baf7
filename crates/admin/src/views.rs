//! View helpers shared by the admin pages.

use bazaar_core::pagination::Pagination;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub role_label: &'static str,
    pub is_super_admin: bool,
    pub has_shop: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.clone(),
            role_label: admin.role.label(),
            is_super_admin: admin.is_super_admin(),
            has_shop: admin.shop_id.is_some(),
        }
    }
}

/// Queue a notice for the next rendered page.
pub async fn flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(session_keys::FLASH, message.into()).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// Take the pending notice, if any.
pub async fn take_flash(session: &Session) -> Option<String> {
    session
        .remove::<String>(session_keys::FLASH)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read flash message");
            None
        })
}

/// Previous/next links for a listing; `None` at the bounds.
#[derive(Debug, Clone)]
pub struct Pager {
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub label: String,
}

impl Pager {
    pub fn new(pagination: &Pagination, href: impl Fn(u32) -> String) -> Self {
        Self {
            prev_href: pagination.prev().map(&href),
            next_href: pagination.next().map(&href),
            label: format!(
                "Page {} of {} ({} total)",
                pagination.page(),
                pagination.total_pages(),
                pagination.total_items()
            ),
        }
    }

    #[must_use]
    pub const fn is_needed(&self) -> bool {
        self.prev_href.is_some() || self.next_href.is_some()
    }
}

/// Amount with two decimals. The dashboard spans shops in any currency,
/// so no symbol is added.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Date and time for tables, e.g. "2024-03-04 10:30".
#[must_use]
pub fn format_datetime(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d %H:%M").to_string())
}

/// Query-string fragment for optional filters, e.g. `status=open&`.
#[must_use]
pub fn filter_param(name: &str, value: Option<&str>) -> String {
    value.map_or_else(String::new, |v| {
        format!("{name}={}&", urlencoding::encode(v))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pager_bounds() {
        let first = Pager::new(&Pagination::new(1, 20, 45), |n| format!("/orders?page={n}"));
        assert_eq!(first.prev_href, None);
        assert_eq!(first.next_href.as_deref(), Some("/orders?page=2"));
        assert_eq!(first.label, "Page 1 of 3 (45 total)");

        let only = Pager::new(&Pagination::new(1, 20, 5), |n| n.to_string());
        assert!(!only.is_needed());
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(125, 1)), "12.50");
        assert_eq!(format_money(Decimal::new(19999, 3)), "20.00");
    }

    #[test]
    fn test_format_datetime() {
        let at = "2024-03-04T10:30:00Z".parse().ok();
        assert_eq!(format_datetime(at), "2024-03-04 10:30");
        assert_eq!(format_datetime(None), "-");
    }

    #[test]
    fn test_filter_param() {
        assert_eq!(filter_param("status", Some("in_progress")), "status=in_progress&");
        assert_eq!(filter_param("status", None), "");
    }
}
