//! Shop settings page.

use std::str::FromStr;

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use bazaar_backend::ApiError;
use bazaar_core::settings::ShopSettings;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireMerchant;
use crate::models::CurrentAdmin;
use crate::state::AppState;
use crate::views::{AdminUserView, flash, take_flash};

/// Settings form as submitted. Every field is text so a bad value can be
/// shown back to the merchant unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    pub name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub shipping_fee: String,
    #[serde(default)]
    pub free_shipping_threshold: String,
}

impl From<&ShopSettings> for SettingsForm {
    fn from(settings: &ShopSettings) -> Self {
        Self {
            name: settings.name.clone(),
            contact_email: settings.contact_email.clone(),
            contact_phone: settings.contact_phone.clone().unwrap_or_default(),
            address: settings.address.clone().unwrap_or_default(),
            logo_url: settings.logo_url.clone().unwrap_or_default(),
            primary_color: settings.primary_color.clone().unwrap_or_default(),
            shipping_fee: settings.shipping_fee.to_string(),
            free_shipping_threshold: settings
                .free_shipping_threshold
                .map(|t| t.to_string())
                .unwrap_or_default(),
        }
    }
}

fn parse_amount(raw: &str, field: &str) -> std::result::Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|_| format!("{field} must be an amount like 4.99."))
}

impl SettingsForm {
    /// Parse and validate into settings ready for the backend.
    fn settings(&self) -> std::result::Result<ShopSettings, String> {
        let shipping_fee = match self.shipping_fee.trim() {
            "" => Decimal::ZERO,
            raw => parse_amount(raw, "Shipping fee")?,
        };
        let free_shipping_threshold = match self.free_shipping_threshold.trim() {
            "" => None,
            raw => Some(parse_amount(raw, "Free shipping threshold")?),
        };
        ShopSettings {
            name: self.name.clone(),
            contact_email: self.contact_email.clone(),
            contact_phone: Some(self.contact_phone.clone()),
            address: Some(self.address.clone()),
            logo_url: Some(self.logo_url.clone()),
            primary_color: Some(self.primary_color.clone()),
            shipping_fee,
            free_shipping_threshold,
        }
        .validate()
        .map_err(|e| e.to_string())
    }
}

/// Settings page template.
#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub form: SettingsForm,
    pub error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(show).post(update))
}

async fn render(
    admin: &CurrentAdmin,
    session: &Session,
    form: SettingsForm,
    error: Option<String>,
) -> Html<String> {
    let template = SettingsTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: "/settings".to_string(),
        flash: take_flash(session).await,
        form,
        error,
    };
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Current settings.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let (form, error) = match state.backend().shop_settings(admin.token()).await {
        Ok(settings) => (SettingsForm::from(&settings), None),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!("Failed to fetch shop settings: {e}");
            (
                SettingsForm::default(),
                Some("Settings could not be loaded right now.".to_string()),
            )
        }
    };
    Ok(render(&admin, &session, form, error).await)
}

/// Save the settings, re-rendering the form on a rejected field.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireMerchant(admin, _shop): RequireMerchant,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SettingsForm>,
) -> Result<Response> {
    let settings = match form.settings() {
        Ok(settings) => settings,
        Err(message) => {
            return Ok(render(&admin, &session, form, Some(message))
                .await
                .into_response());
        }
    };

    match state
        .backend()
        .update_shop_settings(admin.token(), &settings)
        .await
    {
        Ok(()) => {
            tracing::info!(shop = %settings.name, "Shop settings saved");
            flash(&session, "Settings saved.").await;
            Ok(Redirect::to("/settings").into_response())
        }
        Err(ApiError::Validation(message)) => Ok(render(&admin, &session, form, Some(message))
            .await
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> SettingsForm {
        SettingsForm {
            name: " Corner Shop ".to_string(),
            contact_email: "owner@corner.example".to_string(),
            primary_color: "#1A2B3C".to_string(),
            shipping_fee: "4.50".to_string(),
            ..SettingsForm::default()
        }
    }

    #[test]
    fn test_valid_form_is_cleaned() {
        let settings = form().settings().unwrap();
        assert_eq!(settings.name, "Corner Shop");
        assert_eq!(settings.shipping_fee, Decimal::new(450, 2));
        assert_eq!(settings.free_shipping_threshold, None);
        assert_eq!(settings.contact_phone, None);
        assert_eq!(settings.primary_color.as_deref(), Some("#1a2b3c"));
    }

    #[test]
    fn test_bad_amounts_are_reported() {
        let bad_fee = SettingsForm {
            shipping_fee: "free".to_string(),
            ..form()
        };
        assert_eq!(
            bad_fee.settings().unwrap_err(),
            "Shipping fee must be an amount like 4.99."
        );

        let negative = SettingsForm {
            free_shipping_threshold: "-1".to_string(),
            ..form()
        };
        assert_eq!(negative.settings().unwrap_err(), "Fees cannot be negative");
    }

    #[test]
    fn test_form_round_trips_settings() {
        let settings = form().settings().unwrap();
        let back = SettingsForm::from(&settings);
        assert_eq!(back.shipping_fee, "4.50");
        assert_eq!(back.free_shipping_threshold, "");
        assert_eq!(back.settings().unwrap(), settings);
    }
}
