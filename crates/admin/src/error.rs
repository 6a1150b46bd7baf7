//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_backend::ApiError;
use thiserror::Error;

/// Marker placed on responses caused by a rejected backend token, so the
/// session-expiry middleware can sign the staff member out.
#[derive(Debug, Clone, Copy)]
pub struct SessionExpired;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Commerce backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] ApiError),

    /// Session store read or write failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

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
            Self::Session(_) | Self::Internal(_) => true,
            Self::Backend(err) => matches!(
                err,
                ApiError::Http(_) | ApiError::Status { .. } | ApiError::Parse(_) | ApiError::Url(_)
            ),
            Self::NotFound(_) | Self::Forbidden(_) | Self::BadRequest(_) => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        if let Self::Backend(ApiError::Unauthorized) = self {
            let mut response = Redirect::to("/auth/login?expired=1").into_response();
            response.extensions_mut().insert(SessionExpired);
            return response;
        }

        let status = match &self {
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(err) => match err {
                ApiError::NotFound(_) => StatusCode::NOT_FOUND,
                ApiError::Validation(_) => StatusCode::BAD_REQUEST,
                ApiError::Forbidden => StatusCode::FORBIDDEN,
                ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Backend(err) => err.user_message(),
            _ => self.to_string(),
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

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(ApiError::Forbidden.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(
                ApiError::Status {
                    status: 503,
                    message: "down".into()
                }
                .into()
            ),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_backend_unauthorized_redirects_to_login() {
        let response = AppError::from(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login?expired=1")
        );
        assert!(response.extensions().get::<SessionExpired>().is_some());
    }
}
