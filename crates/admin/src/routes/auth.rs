//! Authentication route handlers for admin.
//!
//! Staff sign in with their backend account. Only merchant and superadmin
//! roles are let in; the bearer token is kept in the server-side session.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use bazaar_backend::{ApiError, LoginRequest};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;
use crate::views::{flash, take_flash};

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    email: String,
    error: Option<String>,
    notice: Option<String>,
}

impl LoginPageTemplate {
    fn html(self) -> Html<String> {
        Html(self.render().unwrap_or_else(|e| {
            tracing::error!("Template render error: {}", e);
            "Internal Server Error".to_string()
        }))
    }
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub expired: Option<String>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    session: Session,
    Query(query): Query<LoginQuery>,
) -> Response {
    if let Some(admin) = admin {
        return Redirect::to(admin.home_path()).into_response();
    }
    let notice = match query.expired {
        Some(_) => Some("Your session has expired. Please sign in again.".to_string()),
        None => take_flash(&session).await,
    };
    LoginPageTemplate {
        email: String::new(),
        error: None,
        notice,
    }
    .html()
    .into_response()
}

/// Check credentials with the backend and keep the staff identity.
///
/// POST /auth/login
#[instrument(skip(state, session, form))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim().to_string();
    let rejected = |email: String, error: &str| {
        LoginPageTemplate {
            email,
            error: Some(error.to_string()),
            notice: None,
        }
        .html()
        .into_response()
    };

    let request = LoginRequest {
        email: email.clone(),
        password: form.password,
    };
    let auth = match state.backend().login(&request).await {
        Ok(auth) => auth,
        Err(e @ (ApiError::Unauthorized | ApiError::Validation(_) | ApiError::NotFound(_))) => {
            tracing::info!(error = %e, "Admin login rejected");
            return Ok(rejected(email, "Incorrect email or password."));
        }
        Err(e @ ApiError::RateLimited(_)) => return Ok(rejected(email, &e.user_message())),
        Err(e) => return Err(AppError::Backend(e)),
    };

    if !auth.user.role.is_staff() {
        tracing::warn!(
            user = %auth.user.id,
            role = %auth.user.role,
            "Non-staff account tried the back office"
        );
        return Ok(rejected(
            email,
            "This account cannot sign in to the dashboard.",
        ));
    }

    let admin = CurrentAdmin::new(auth.user, auth.token);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(&admin.email));
    tracing::info!(user = %admin.id, role = %admin.role, "Admin signed in");

    Ok(Redirect::to(admin.home_path()).into_response())
}

/// Logout and clear session.
///
/// POST /auth/logout
#[instrument(skip(session))]
async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    flash(&session, "You have been signed out.").await;
    Ok(Redirect::to("/auth/login"))
}
