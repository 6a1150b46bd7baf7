//! Authentication route handlers.
//!
//! Shoppers sign in against the backend's auth endpoints. The returned bearer
//! token is kept in the server-side session and sent with every call made on
//! the shopper's behalf.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use bazaar_backend::{ApiError, LoginRequest, RegisterRequest};
use bazaar_core::Email;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{CurrentShop, OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::state::AppState;
use crate::views::{Page, flash};

const MIN_PASSWORD_LENGTH: usize = 8;
const DEFAULT_RETURN_PATH: &str = "/account";

/// Where to send the shopper after signing in.
///
/// Only same-site paths are honoured; anything else (absolute or
/// protocol-relative URLs) falls back to the account page.
#[must_use]
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") =>
        {
            path.to_string()
        }
        _ => DEFAULT_RETURN_PATH.to_string(),
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
    pub password_confirm: String,
    pub next: Option<String>,
}

impl RegisterForm {
    /// Check the form before calling the backend.
    fn validate(&self) -> std::result::Result<Email, String> {
        if self.name.trim().is_empty() {
            return Err("Please enter your name.".to_string());
        }
        let email = Email::parse(self.email.trim()).map_err(|e| e.to_string())?;
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters."
            ));
        }
        if self.password != self.password_confirm {
            return Err("Passwords do not match.".to_string());
        }
        Ok(email)
    }
}

/// Query parameters of the auth pages.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub next: Option<String>,
    pub expired: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: Page,
    pub email: String,
    pub next: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: Page,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub next: String,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in shoppers go straight to `next`.
pub async fn login_page(
    OptionalAuth(customer): OptionalAuth,
    page: Page,
    Query(query): Query<AuthQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if customer.is_some() {
        return Redirect::to(&next).into_response();
    }
    LoginTemplate {
        page,
        email: String::new(),
        next,
        error: None,
        notice: query
            .expired
            .map(|_| "Your session has expired. Please sign in again.".to_string()),
    }
    .into_response()
}

/// Sign the shopper in and remember the backend token in the session.
#[instrument(skip(state, session, page, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: Page,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref());
    let request = LoginRequest {
        email: form.email.trim().to_string(),
        password: form.password,
    };

    let auth = match state.backend().login(&request).await {
        Ok(auth) => auth,
        Err(e @ (ApiError::Unauthorized | ApiError::Validation(_) | ApiError::NotFound(_))) => {
            tracing::info!(error = %e, "Login rejected");
            return Ok(LoginTemplate {
                page,
                email: request.email,
                next,
                error: Some("Incorrect email or password.".to_string()),
                notice: None,
            }
            .into_response());
        }
        Err(e @ ApiError::RateLimited(_)) => {
            return Ok(LoginTemplate {
                page,
                email: request.email,
                next,
                error: Some(e.user_message()),
                notice: None,
            }
            .into_response());
        }
        Err(e) => return Err(AppError::Backend(e)),
    };

    let customer = CurrentCustomer::new(auth.user, auth.token);
    set_current_customer(&session, &customer).await?;
    set_sentry_user(&customer.id, Some(&customer.email));
    tracing::info!(user = %customer.id, "Customer signed in");

    flash(&session, format!("Welcome back, {}!", customer.first_name())).await;
    Ok(Redirect::to(&next).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(customer): OptionalAuth,
    page: Page,
    Query(query): Query<AuthQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if customer.is_some() {
        return Redirect::to(&next).into_response();
    }
    RegisterTemplate {
        page,
        name: String::new(),
        email: String::new(),
        phone: String::new(),
        next,
        error: None,
    }
    .into_response()
}

/// Create an account in the current shop and sign the shopper in.
#[instrument(skip(state, session, shop, page, form), fields(shop = %shop.slug))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    CurrentShop(shop): CurrentShop,
    page: Page,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let next = safe_next(form.next.as_deref());
    let rerender = |form: &RegisterForm, error: String| {
        RegisterTemplate {
            page: page.clone(),
            name: form.name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            next: next.clone(),
            error: Some(error),
        }
        .into_response()
    };

    let email = match form.validate() {
        Ok(email) => email,
        Err(error) => return Ok(rerender(&form, error)),
    };

    let request = RegisterRequest {
        name: form.name.trim().to_string(),
        email: email.into_inner(),
        password: form.password.clone(),
        phone: Some(form.phone.trim().to_string()).filter(|p| !p.is_empty()),
        shop_id: shop.id,
    };
    let auth = match state.backend().register(&request).await {
        Ok(auth) => auth,
        Err(ApiError::Validation(message)) => return Ok(rerender(&form, message)),
        Err(e) => return Err(AppError::Backend(e)),
    };

    let customer = CurrentCustomer::new(auth.user, auth.token);
    set_current_customer(&session, &customer).await?;
    set_sentry_user(&customer.id, Some(&customer.email));
    tracing::info!(user = %customer.id, "Customer registered");

    flash(&session, format!("Welcome to {}, {}!", shop.name, customer.first_name())).await;
    Ok(Redirect::to(&next).into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Sign the shopper out. Carts stay in the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    flash(&session, "You have been signed out.").await;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form(password: &str, confirm: &str) -> RegisterForm {
        RegisterForm {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: String::new(),
            password: password.to_string(),
            password_confirm: confirm.to_string(),
            next: None,
        }
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("/checkout")), "/checkout");
        assert_eq!(safe_next(Some("/products?page=2")), "/products?page=2");
        assert_eq!(safe_next(Some("//evil.example")), DEFAULT_RETURN_PATH);
        assert_eq!(safe_next(Some("https://evil.example")), DEFAULT_RETURN_PATH);
        assert_eq!(safe_next(Some("/\\evil.example")), DEFAULT_RETURN_PATH);
        assert_eq!(safe_next(None), DEFAULT_RETURN_PATH);
    }

    #[test]
    fn test_register_form_validation() {
        assert!(register_form("longenough", "longenough").validate().is_ok());
        assert_eq!(
            register_form("short", "short").validate(),
            Err("Password must be at least 8 characters.".to_string())
        );
        assert_eq!(
            register_form("longenough", "different").validate(),
            Err("Passwords do not match.".to_string())
        );

        let mut bad_email = register_form("longenough", "longenough");
        bad_email.email = "not-an-email".to_string();
        assert!(bad_email.validate().is_err());
    }
}
