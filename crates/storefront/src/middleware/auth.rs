//! Shopper authentication extractors and session helpers.

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::{SessionExpired, clear_sentry_user};
use crate::models::{CurrentCustomer, session_keys};

/// Extractor that requires a signed-in shopper.
///
/// Anonymous visitors are redirected to the sign-in page, which sends them
/// back to the page they asked for afterwards.
///
/// ```rust,ignore
/// async fn orders(RequireAuth(customer): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", customer.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

/// Rejection for [`RequireAuth`].
pub enum AuthRejection {
    /// Redirect to the sign-in page, remembering where to return.
    RedirectToLogin(String),
    /// Session layer missing from the stack.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => Redirect::to(&format!(
                "/auth/login?next={}",
                urlencoding::encode(&next)
            ))
            .into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;

        let customer: CurrentCustomer = session
            .get(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                let next = parts
                    .uri
                    .path_and_query()
                    .map_or("/", |pq| pq.as_str())
                    .to_string();
                AuthRejection::RedirectToLogin(next)
            })?;

        Ok(Self(customer))
    }
}

/// Extractor that optionally gets the signed-in shopper.
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_customer(parts.extensions.get::<Session>()).await))
    }
}

pub(crate) async fn current_customer(session: Option<&Session>) -> Option<CurrentCustomer> {
    match session {
        Some(session) => session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await
            .ok()
            .flatten(),
        None => None,
    }
}

/// Store the signed-in shopper in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Remove the shopper from the session. Carts stay.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    Ok(())
}

/// Drop the shopper's identity when a handler hit a rejected backend token.
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.extensions().get::<SessionExpired>().is_some() {
        tracing::info!("Backend rejected the session token, signing out");
        if let Err(e) = clear_current_customer(&session).await {
            tracing::error!(error = %e, "Failed to clear expired session");
        }
        clear_sentry_user();
    }
    response
}
