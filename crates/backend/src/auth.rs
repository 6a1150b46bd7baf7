//! Customer and staff sign-in.

use tracing::instrument;

use crate::client::BackendClient;
use crate::error::ApiError;
use crate::types::{AuthResponse, AuthUser, LoginRequest, RegisterRequest};

impl BackendClient {
    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] or [`ApiError::Validation`] for bad
    /// credentials, or an error if the API request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post("/api/auth/login", None, request).await
    }

    /// Create a customer account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the backend rejects the form
    /// (e.g. email already taken), or an error if the API request fails.
    #[instrument(skip(self, request), fields(email = %request.email, shop = %request.shop_id))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post("/api/auth/register", None, request).await
    }

    /// Account behind a token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for expired tokens.
    #[instrument(skip_all)]
    pub async fn me(&self, token: &str) -> Result<AuthUser, ApiError> {
        self.get("/api/auth/me", &[], Some(token)).await
    }
}
