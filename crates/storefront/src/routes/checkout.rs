//! Checkout: shipping details, payment choice and order placement.
//!
//! The cart's lines go to the backend as product/variant/quantity only; the
//! backend re-prices them and checks stock.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_backend::ApiError;
use bazaar_core::order::{CheckoutRequest, OrderError, ShippingAddress};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::visit::mark_converted;
use crate::middleware::{CurrentShop, RequireAuth};
use crate::routes::cart::CartView;
use crate::state::AppState;
use crate::views::{Page, flash, load_cart, save_cart};

/// Payment methods offered at checkout, as (value, label).
pub const PAYMENT_METHODS: &[(&str, &str)] = &[
    ("cash_on_delivery", "Cash on delivery"),
    ("bank_transfer", "Bank transfer"),
];

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub note: String,
}

impl CheckoutForm {
    fn address(&self) -> ShippingAddress {
        ShippingAddress {
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            line1: self.line1.clone(),
            line2: Some(self.line2.clone()),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }

    fn payment_method(&self) -> Option<&'static str> {
        PAYMENT_METHODS
            .iter()
            .find(|(value, _)| *value == self.payment_method)
            .map(|(value, _)| *value)
    }
}

/// A payment radio option.
#[derive(Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

fn payment_options(selected: &str) -> Vec<PaymentOption> {
    PAYMENT_METHODS
        .iter()
        .enumerate()
        .map(|(i, &(value, label))| PaymentOption {
            value,
            label,
            checked: value == selected || (selected.is_empty() && i == 0),
        })
        .collect()
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub page: Page,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub payment_options: Vec<PaymentOption>,
    pub error: Option<String>,
}

/// Display the checkout form.
#[instrument(skip(session, shop, page, customer), fields(shop = %shop.slug))]
pub async fn show(
    RequireAuth(customer): RequireAuth,
    session: Session,
    CurrentShop(shop): CurrentShop,
    page: Page,
) -> Result<Response> {
    let cart = load_cart(&session, &shop).await;
    if cart.is_empty() {
        flash(&session, OrderError::EmptyCart.to_string()).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let form = CheckoutForm {
        full_name: customer.name.clone(),
        ..CheckoutForm::default()
    };
    Ok(CheckoutTemplate {
        page,
        cart: CartView::new(&cart, &shop),
        payment_options: payment_options(&form.payment_method),
        form,
        error: None,
    }
    .into_response())
}

/// Place the order.
///
/// Validation problems re-render the form with the shopper's input kept.
/// On success the cart is emptied, the visit is marked converted and the
/// shopper lands on the order's tracking page.
#[instrument(skip(state, session, shop, page, customer, form), fields(shop = %shop.slug))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    session: Session,
    CurrentShop(shop): CurrentShop,
    page: Page,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session, &shop).await;
    if cart.is_empty() {
        flash(&session, OrderError::EmptyCart.to_string()).await;
        return Ok(Redirect::to("/cart").into_response());
    }

    let rerender = |form: CheckoutForm, error: String| {
        CheckoutTemplate {
            page: page.clone(),
            cart: CartView::new(&cart, &shop),
            payment_options: payment_options(&form.payment_method),
            form,
            error: Some(error),
        }
        .into_response()
    };

    let shipping_address = match form.address().normalized() {
        Ok(address) => address,
        Err(e) => return Ok(rerender(form, e.to_string())),
    };
    let Some(payment_method) = form.payment_method() else {
        return Ok(rerender(form, "Please choose a payment method.".to_string()));
    };

    let request = CheckoutRequest {
        shop_id: shop.id,
        items: cart.checkout_lines(),
        shipping_address,
        payment_method: payment_method.to_string(),
        note: Some(form.note.trim().to_string()).filter(|n| !n.is_empty()),
    };

    let order = match state.backend().place_order(customer.token(), &request).await {
        Ok(order) => order,
        Err(ApiError::Validation(message)) => return Ok(rerender(form, message)),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(order = %order.id, items = request.items.len(), "Order placed");
    cart.clear();
    save_cart(&session, &shop, &cart).await?;
    mark_converted(&state, &session, &shop.slug, order.id).await;
    flash(
        &session,
        format!("Thank you! Order {} has been placed.", order.display_number()),
    )
    .await;

    Ok(Redirect::to(&format!("/account/orders/{}", order.id)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_must_be_offered() {
        let form = CheckoutForm {
            payment_method: "bank_transfer".to_string(),
            ..CheckoutForm::default()
        };
        assert_eq!(form.payment_method(), Some("bank_transfer"));

        let bogus = CheckoutForm {
            payment_method: "bitcoin".to_string(),
            ..CheckoutForm::default()
        };
        assert_eq!(bogus.payment_method(), None);
    }

    #[test]
    fn test_first_payment_option_checked_by_default() {
        let options = payment_options("");
        assert!(options.first().is_some_and(|o| o.checked));
        assert!(options.iter().skip(1).all(|o| !o.checked));
    }

    #[test]
    fn test_blank_second_line_is_dropped() {
        let form = CheckoutForm {
            full_name: " Ada ".to_string(),
            phone: "555".to_string(),
            line1: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            country: "US".to_string(),
            ..CheckoutForm::default()
        };
        let address = form.address().normalized().unwrap_or_default();
        assert_eq!(address.full_name, "Ada");
        assert_eq!(address.line2, None);
    }
}
