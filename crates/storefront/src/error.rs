//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_backend::ApiError;
use thiserror::Error;

/// Marker placed on responses caused by a rejected backend token.
///
/// The session-expiry middleware drops the shopper's identity when it sees
/// this on the way out.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] ApiError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Template rendering failed.
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Session(_) | Self::Render(_) | Self::Internal(_) => true,
            Self::Backend(err) => matches!(
                err,
                ApiError::Http(_) | ApiError::Status { .. } | ApiError::Parse(_) | ApiError::Url(_)
            ),
            Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        if let Self::Backend(ApiError::Unauthorized) = self {
            let mut response = Redirect::to("/auth/login?expired=1").into_response();
            response.extensions_mut().insert(SessionExpired);
            return response;
        }

        let status = match &self {
            Self::Session(_) | Self::Render(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Backend(err) => match err {
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Validation(_) => StatusCode::BAD_REQUEST,
                ApiError::Forbidden => StatusCode::FORBIDDEN,
                ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Render(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Backend(err) => err.user_message(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::BadRequest(reason) => reason.clone(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");
    }

    #[test]
    fn test_backend_errors_map_to_statuses() {
        assert_eq!(
            status(ApiError::NotFound("x".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(ApiError::Validation("bad".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(ApiError::Forbidden.into()), StatusCode::FORBIDDEN);
        assert_eq!(
            status(
                ApiError::Status {
                    status: 500,
                    message: "boom".into()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_unauthorized_redirects_and_marks_session() {
        let response = AppError::from(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login?expired=1")
        );
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }

    #[test]
    fn test_local_errors() {
        assert_eq!(
            status(AppError::BadRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
