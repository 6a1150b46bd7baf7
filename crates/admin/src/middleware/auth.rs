//! Authentication middleware and extractors for admin.
//!
//! Three levels of access:
//! - [`RequireAdminAuth`]: any signed-in staff member
//! - [`RequireMerchant`]: a staff account linked to a shop
//! - [`RequireSuperAdmin`]: the platform administrator role

use axum::{
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::ShopId;
use tower_sessions::Session;

use crate::error::{SessionExpired, clear_sentry_user};
use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires admin authentication.
///
/// If the admin is not logged in, returns a redirect to the login page.
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when an access check fails.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// Not signed in.
    RedirectToLogin,
    /// Signed in without the needed role or shop.
    Forbidden(&'static str),
    /// Session layer missing from the stack.
    MissingSession,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Forbidden(reason) => (StatusCode::FORBIDDEN, reason).into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

async fn signed_in_admin(parts: &Parts) -> Result<CurrentAdmin, AdminAuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::MissingSession)?;

    session
        .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .ok_or(AdminAuthRejection::RedirectToLogin)
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        signed_in_admin(parts).await.map(Self)
    }
}

/// Extractor that optionally gets the current admin.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(signed_in_admin(parts).await.ok()))
    }
}

/// Extractor for shop-scoped pages: the account must manage a shop.
///
/// ```rust,ignore
/// async fn inventory(RequireMerchant(admin, shop): RequireMerchant) -> impl IntoResponse {
///     format!("{} manages shop {shop}", admin.name)
/// }
/// ```
pub struct RequireMerchant(pub CurrentAdmin, pub ShopId);

impl<S> FromRequestParts<S> for RequireMerchant
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = signed_in_admin(parts).await?;
        match admin.shop_id {
            Some(shop) => Ok(Self(admin, shop)),
            None => Err(AdminAuthRejection::Forbidden(
                "This page needs an account linked to a shop",
            )),
        }
    }
}

/// Extractor that requires super admin authentication.
///
/// If the admin is not logged in, redirects to login.
/// If the admin is not a super admin, returns 403 Forbidden.
pub struct RequireSuperAdmin(pub CurrentAdmin);

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = signed_in_admin(parts).await?;
        if !admin.is_super_admin() {
            return Err(AdminAuthRejection::Forbidden(
                "Only super admins can access this resource",
            ));
        }
        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}

/// Sign the staff member out when a handler hit a rejected backend token.
pub async fn session_expiry_middleware(session: Session, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.extensions().get::<SessionExpired>().is_some() {
        tracing::info!("Backend rejected the staff token, signing out");
        if let Err(e) = clear_current_admin(&session).await {
            tracing::error!(error = %e, "Failed to clear expired admin session");
        }
        clear_sentry_user();
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tower_sessions::MemoryStore;

    use super::*;

    async fn parts_with(admin: Option<serde_json::Value>) -> Parts {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        if let Some(admin) = admin {
            session
                .insert(session_keys::CURRENT_ADMIN, admin)
                .await
                .unwrap();
        }
        let (mut parts, ()) = HttpRequest::builder()
            .uri("/inventory")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(session);
        parts
    }

    fn stored(role: &str, shop_id: Option<i64>) -> serde_json::Value {
        serde_json::json!({
            "id": 9,
            "name": "Staff",
            "email": "staff@example.com",
            "role": role,
            "shop_id": shop_id,
            "token": "t",
        })
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login() {
        let mut parts = parts_with(None).await;
        let rejection = RequireAdminAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_merchant_pages_need_a_shop() {
        let mut parts = parts_with(Some(stored("merchant", Some(4)))).await;
        let RequireMerchant(_, shop) = RequireMerchant::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(shop, ShopId::new(4));

        let mut parts = parts_with(Some(stored("superadmin", None))).await;
        let rejection = RequireMerchant::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(rejection, AdminAuthRejection::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_superadmin_pages_need_the_role() {
        let mut parts = parts_with(Some(stored("merchant", Some(4)))).await;
        let rejection = RequireSuperAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection.into_response().status(), StatusCode::FORBIDDEN);

        let mut parts = parts_with(Some(stored("superadmin", None))).await;
        assert!(
            RequireSuperAdmin::from_request_parts(&mut parts, &())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_optional_auth_without_session() {
        let (mut parts, _body) = HttpRequest::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let OptionalAdminAuth(admin) = OptionalAdminAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(admin.is_none());
    }
}
