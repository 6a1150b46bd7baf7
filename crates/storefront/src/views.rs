//! Template-facing view models shared by several pages.
//!
//! Templates stay dumb: every label, price string and link is computed here
//! or in the route module that owns the page.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bazaar_core::cart::Cart;
use bazaar_core::catalog::Product;
use bazaar_core::pagination::Pagination;
use bazaar_core::shop::Shop;
use chrono::{DateTime, Utc};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::auth::current_customer;
use crate::middleware::{CspNonce, CurrentShop};
use crate::models::session_keys;
use crate::state::AppState;

/// Layout context every full page needs: shop branding, header state and
/// the one-shot flash message.
#[derive(Debug, Clone)]
pub struct Page {
    pub shop_name: String,
    pub primary_color: String,
    pub accent_color: String,
    pub logo_url: Option<String>,
    pub support_email: Option<String>,
    pub customer_name: Option<String>,
    pub cart_count: u32,
    pub nonce: String,
    pub flash: Option<String>,
}

impl Page {
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.customer_name.is_some()
    }
}

impl FromRequestParts<AppState> for Page {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(CurrentShop(shop)) = CurrentShop::from_request_parts(parts, state).await;
        let Ok(CspNonce(nonce)) = CspNonce::from_request_parts(parts, state).await;
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        let customer = current_customer(Some(&session)).await;
        let cart_count = load_cart(&session, &shop).await.item_count();
        let flash = session.remove::<String>(session_keys::FLASH).await?;

        Ok(Self {
            shop_name: shop.name.clone(),
            primary_color: shop.theme.primary_color.clone(),
            accent_color: shop.theme.accent_color.clone(),
            logo_url: shop.theme.logo_url.clone(),
            support_email: shop.support_email.clone(),
            customer_name: customer.map(|c| c.first_name().to_string()),
            cart_count,
            nonce,
            flash,
        })
    }
}

/// The visitor's cart for `shop`; unreadable carts count as empty.
pub async fn load_cart(session: &Session, shop: &Shop) -> Cart {
    match session.get::<Cart>(&session_keys::cart(&shop.slug)).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, shop = %shop.slug, "Discarding unreadable cart");
            Cart::default()
        }
    }
}

/// Persist the visitor's cart for `shop`.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save_cart(session: &Session, shop: &Shop, cart: &Cart) -> Result<(), AppError> {
    session.insert(&session_keys::cart(&shop.slug), cart).await?;
    Ok(())
}

/// Queue a message for the next rendered page.
pub async fn flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(session_keys::FLASH, message.into()).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
}

/// A product tile on listing pages.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub href: String,
    pub name: String,
    pub image_url: Option<String>,
    pub image_alt: String,
    pub price: String,
    pub compare_at: Option<String>,
    pub discount_percent: Option<u32>,
    pub stock_label: String,
    pub stock_class: &'static str,
    pub rating: Option<String>,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, shop: &Shop) -> Self {
        let stock = product.stock_status();
        let image = product.primary_image();
        Self {
            href: format!("/products/{}", product.id),
            name: product.name.clone(),
            image_url: image.map(|i| i.url.clone()),
            image_alt: image
                .and_then(|i| i.alt.clone())
                .unwrap_or_else(|| product.name.clone()),
            price: shop.format(product.effective_price()),
            compare_at: product.compare_at_price().map(|p| shop.format(p)),
            discount_percent: product.discount_percent(),
            stock_label: stock.label(),
            stock_class: stock.badge_class(),
            rating: product
                .rating
                .filter(|r| r.count > 0)
                .map(|r| format!("{:.1} ({})", r.average, r.count)),
        }
    }
}

/// One numbered pagination link.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub number: u32,
    pub href: String,
    pub current: bool,
}

/// Previous/next and numbered links for a listing.
///
/// Previous and next are `None` at the bounds, so the template renders them
/// disabled.
#[derive(Debug, Clone)]
pub struct Pager {
    pub prev_href: Option<String>,
    pub next_href: Option<String>,
    pub links: Vec<PageLink>,
    pub summary: Option<String>,
}

impl Pager {
    const WINDOW_RADIUS: u32 = 2;

    pub fn new(pagination: &Pagination, href: impl Fn(u32) -> String) -> Self {
        Self {
            prev_href: pagination.prev().map(&href),
            next_href: pagination.next().map(&href),
            links: pagination
                .window(Self::WINDOW_RADIUS)
                .into_iter()
                .map(|number| PageLink {
                    number,
                    href: href(number),
                    current: number == pagination.page(),
                })
                .collect(),
            summary: pagination.item_range().map(|(first, last)| {
                format!(
                    "Showing {first}-{last} of {}",
                    pagination.total_items()
                )
            }),
        }
    }

    /// Whether there is more than one page to move between.
    #[must_use]
    pub fn is_needed(&self) -> bool {
        self.links.len() > 1
    }
}

/// Date shown in order and ticket lists, e.g. "Mar 4, 2024".
#[must_use]
pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(String::new, |at| at.format("%b %-d, %Y").to_string())
}

/// Date and time for timelines and message threads.
#[must_use]
pub fn format_datetime(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(String::new, |at| at.format("%b %-d, %Y %H:%M").to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_pager_disables_controls_at_bounds() {
        let pager = Pager::new(&Pagination::new(1, 10, 35), |n| format!("/x?page={n}"));
        assert_eq!(pager.prev_href, None);
        assert_eq!(pager.next_href.as_deref(), Some("/x?page=2"));
        assert_eq!(pager.links.len(), 3);
        assert!(pager.links[0].current);
        assert_eq!(pager.summary.as_deref(), Some("Showing 1-10 of 35"));

        let last = Pager::new(&Pagination::new(4, 10, 35), |n| n.to_string());
        assert_eq!(last.next_href, None);
        assert_eq!(last.prev_href.as_deref(), Some("3"));
    }

    #[test]
    fn test_single_page_needs_no_pager() {
        let pager = Pager::new(&Pagination::new(1, 10, 3), |n| n.to_string());
        assert!(!pager.is_needed());
    }

    #[test]
    fn test_product_card_prices() {
        let shop: Shop = serde_json::from_value(serde_json::json!({
            "id": 1, "slug": "acme", "name": "Acme", "currency": "EUR"
        }))
        .unwrap();
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 9,
            "name": "Scarf",
            "price": "40.00",
            "special_price": "30.00",
            "stock_qty": 2
        }))
        .unwrap();
        let card = ProductCard::new(&product, &shop);
        assert_eq!(card.href, "/products/9");
        assert_eq!(card.price, "€30.00");
        assert_eq!(card.compare_at.as_deref(), Some("€40.00"));
        assert_eq!(card.discount_percent, Some(25));
        assert_eq!(card.stock_label, "Only 2 left");
    }

    #[test]
    fn test_format_date() {
        let at = "2024-03-04T10:30:00Z".parse().ok();
        assert_eq!(format_date(at), "Mar 4, 2024");
        assert_eq!(format_datetime(at), "Mar 4, 2024 10:30");
        assert_eq!(format_date(None), "");
    }
}
