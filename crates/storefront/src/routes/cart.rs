//! Cart route handlers.
//!
//! Carts live in the session, one per shop. Prices and stock caps are taken
//! from the backend when a line is added, never from the form. Adding from a
//! product card goes through HTMX and only swaps the header badge.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use bazaar_core::cart::{Cart, CartLine};
use bazaar_core::shop::Shop;
use bazaar_core::{ProductId, VariantId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CurrentShop;
use crate::state::AppState;
use crate::views::{Page, flash, load_cart, save_cart};

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub variant_id: String,
    pub href: String,
    pub name: String,
    pub variant_label: Option<String>,
    pub image_url: Option<String>,
    pub unit_price: String,
    pub quantity: u32,
    pub max_quantity: u32,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    /// "Add $12.00 more for free shipping."
    pub free_shipping_hint: Option<String>,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, shop: &Shop) -> Self {
        let totals = cart.totals(&shop.shipping);
        let free_shipping_hint = shop
            .shipping
            .free_over
            .filter(|threshold| !cart.is_empty() && totals.subtotal < *threshold)
            .map(|threshold| {
                format!(
                    "Add {} more for free shipping.",
                    shop.format(threshold - totals.subtotal)
                )
            });

        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    product_id: line.product_id.to_string(),
                    variant_id: line.variant_id.map(|v| v.to_string()).unwrap_or_default(),
                    href: format!("/products/{}", line.product_id),
                    name: line.name.clone(),
                    variant_label: line.variant_label.clone(),
                    image_url: line.image_url.clone(),
                    unit_price: shop.format(line.unit_price),
                    quantity: line.quantity,
                    max_quantity: line.max_quantity,
                    line_total: shop.format(line.line_total()),
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: shop.format(totals.subtotal),
            shipping: if totals.shipping == Decimal::ZERO {
                "Free".to_string()
            } else {
                shop.format(totals.shipping)
            },
            total: shop.format(totals.total),
            free_shipping_hint,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Empty form fields mean "no variant".
fn variant_param(value: Option<&str>) -> Option<VariantId> {
    value.map(str::trim).filter(|v| !v.is_empty()).and_then(|v| v.parse().ok())
}

fn stock_cap(stock: i64) -> u32 {
    u32::try_from(stock.max(0)).unwrap_or(u32::MAX)
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub variant_id: Option<String>,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
    pub variant_id: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: Page,
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline error shown next to an HTMX add-to-cart button.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_error.html")]
pub struct CartErrorTemplate {
    pub message: String,
}

/// Display cart page.
#[instrument(skip(session, shop, page), fields(shop = %shop.slug))]
pub async fn show(
    session: Session,
    CurrentShop(shop): CurrentShop,
    page: Page,
) -> impl IntoResponse {
    let cart = load_cart(&session, &shop).await;
    CartShowTemplate {
        page,
        cart: CartView::new(&cart, &shop),
    }
}

/// Build the cart line for a product from the backend's copy of it.
async fn trusted_line(
    state: &AppState,
    shop: &Shop,
    form: &AddToCartForm,
) -> Result<std::result::Result<CartLine, String>> {
    let product = match state.backend().product(shop.id, form.product_id).await {
        Ok(product) => product,
        Err(e) if e.is_not_found() => {
            return Ok(Err("That product is no longer available.".to_string()));
        }
        Err(e) => return Err(AppError::Backend(e)),
    };

    let variant = match variant_param(form.variant_id.as_deref()) {
        Some(id) => match product.variant(id) {
            Some(variant) => Some(variant),
            None => return Ok(Err("That option is no longer available.".to_string())),
        },
        None if !product.variants.is_empty() => {
            return Ok(Err("Please choose your options first.".to_string()));
        }
        None => None,
    };

    let image_url = variant
        .and_then(|v| v.image.as_ref())
        .or_else(|| product.primary_image())
        .map(|i| i.url.clone());

    Ok(Ok(CartLine {
        product_id: product.id,
        variant_id: variant.map(|v| v.id),
        name: product.name.clone(),
        variant_label: variant.map(bazaar_core::catalog::Variant::label),
        unit_price: variant.map_or_else(|| product.effective_price(), |v| product.variant_price(v)),
        quantity: form.quantity.unwrap_or(1),
        max_quantity: stock_cap(variant.map_or_else(|| product.total_stock(), |v| v.stock_qty)),
        image_url,
    }))
}

/// Add item to cart.
///
/// HTMX requests get the updated badge, retargeted onto the header, plus a
/// `cart-updated` trigger. Failures come back as a 422 fragment for the
/// form's own feedback slot. Plain form posts are redirected with a flash.
#[instrument(skip(state, session, shop, headers), fields(shop = %shop.slug))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    CurrentShop(shop): CurrentShop,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let htmx = is_htmx(&headers);
    let back = format!("/products/{}", form.product_id);
    let mut cart = load_cart(&session, &shop).await;

    let outcome = match trusted_line(&state, &shop, &form).await? {
        Ok(line) => cart.add(line).map_err(|e| e.to_string()),
        Err(message) => Err(message),
    };

    match outcome {
        Ok(quantity) => {
            save_cart(&session, &shop, &cart).await?;
            tracing::info!(product = %form.product_id, quantity, "Added to cart");
            if htmx {
                return Ok((
                    AppendHeaders([
                        ("HX-Trigger", "cart-updated"),
                        ("HX-Retarget", "#cart-count"),
                        ("HX-Reswap", "outerHTML"),
                    ]),
                    CartCountTemplate {
                        count: cart.item_count(),
                    },
                )
                    .into_response());
            }
            flash(&session, "Added to your cart.").await;
            Ok(Redirect::to("/cart").into_response())
        }
        Err(message) => {
            if htmx {
                return Ok((
                    StatusCode::UNPROCESSABLE_ENTITY,
                    CartErrorTemplate { message },
                )
                    .into_response());
            }
            flash(&session, message).await;
            Ok(Redirect::to(&back).into_response())
        }
    }
}

/// Update cart item quantity. Zero removes the line.
#[instrument(skip(session, shop), fields(shop = %shop.slug))]
pub async fn update(
    session: Session,
    CurrentShop(shop): CurrentShop,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let mut cart = load_cart(&session, &shop).await;
    let variant = variant_param(form.variant_id.as_deref());

    match cart.set_quantity(form.product_id, variant, form.quantity) {
        Ok(kept) if kept < form.quantity => {
            flash(&session, format!("Only {kept} available.")).await;
        }
        Ok(_) => {}
        Err(e) => flash(&session, e.to_string()).await,
    }
    save_cart(&session, &shop, &cart).await?;
    Ok(Redirect::to("/cart"))
}

/// Remove item from cart.
#[instrument(skip(session, shop), fields(shop = %shop.slug))]
pub async fn remove(
    session: Session,
    CurrentShop(shop): CurrentShop,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let mut cart = load_cart(&session, &shop).await;
    if cart.remove(form.product_id, variant_param(form.variant_id.as_deref())) {
        save_cart(&session, &shop, &cart).await?;
        flash(&session, "Item removed.").await;
    }
    Ok(Redirect::to("/cart"))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session, shop), fields(shop = %shop.slug))]
pub async fn count(session: Session, CurrentShop(shop): CurrentShop) -> impl IntoResponse {
    CartCountTemplate {
        count: load_cart(&session, &shop).await.item_count(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn shop() -> Shop {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "slug": "acme",
            "name": "Acme",
            "shipping": {"flat_fee": "5.00", "free_over": "50.00"}
        }))
        .unwrap()
    }

    fn line(price: &str, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(1),
            variant_id: None,
            name: "Mug".to_string(),
            variant_label: None,
            unit_price: price.parse().unwrap(),
            quantity,
            max_quantity: 10,
            image_url: None,
        }
    }

    #[test]
    fn test_cart_view_totals_and_hint() {
        let mut cart = Cart::default();
        cart.add(line("12.00", 2)).unwrap();
        let view = CartView::new(&cart, &shop());
        assert_eq!(view.subtotal, "$24.00");
        assert_eq!(view.shipping, "$5.00");
        assert_eq!(view.total, "$29.00");
        assert_eq!(
            view.free_shipping_hint.as_deref(),
            Some("Add $26.00 more for free shipping.")
        );
        assert_eq!(view.lines[0].line_total, "$24.00");
    }

    #[test]
    fn test_cart_view_free_shipping() {
        let mut cart = Cart::default();
        cart.add(line("60.00", 1)).unwrap();
        let view = CartView::new(&cart, &shop());
        assert_eq!(view.shipping, "Free");
        assert_eq!(view.free_shipping_hint, None);
    }

    #[test]
    fn test_variant_param() {
        assert_eq!(variant_param(Some("")), None);
        assert_eq!(variant_param(Some(" 7 ")), Some(VariantId::new(7)));
        assert_eq!(variant_param(None), None);
    }

    #[test]
    fn test_stock_cap() {
        assert_eq!(stock_cap(-3), 0);
        assert_eq!(stock_cap(12), 12);
    }
}
