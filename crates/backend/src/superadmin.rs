//! Platform administration: back-office accounts and review moderation.

use bazaar_core::account::{AdminAccount, AdminAccountInput};
use bazaar_core::review::{Review, ReviewStatus};
use bazaar_core::{ReviewId, UserId};
use reqwest::Method;
use tracing::{info, instrument};

use crate::client::BackendClient;
use crate::error::ApiError;
use crate::types::{Listing, Paginated};

impl BackendClient {
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_accounts(&self, token: &str) -> Result<Vec<AdminAccount>, ApiError> {
        Ok(self
            .get::<Listing<AdminAccount>>("/api/superadmin/admins", &[], Some(token))
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the backend rejects the account
    /// (e.g. email taken).
    #[instrument(skip(self, token, input), fields(email = %input.email, role = %input.role))]
    pub async fn create_admin_account(
        &self,
        token: &str,
        input: &AdminAccountInput,
    ) -> Result<AdminAccount, ApiError> {
        let account: AdminAccount = self
            .post("/api/superadmin/admins", Some(token), input)
            .await?;
        info!(account = %account.id, "Admin account created");
        Ok(account)
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(account = %id))]
    pub async fn delete_admin_account(&self, token: &str, id: UserId) -> Result<(), ApiError> {
        self.send_empty(
            Method::DELETE,
            &format!("/api/superadmin/admins/{id}"),
            Some(token),
        )
        .await
    }

    /// Reviews awaiting (or past) moderation.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn moderation_queue(
        &self,
        token: &str,
        status: ReviewStatus,
        page: u32,
    ) -> Result<Paginated<Review>, ApiError> {
        Ok(self
            .get::<Listing<Review>>(
                "/api/superadmin/reviews",
                &[("status", status.as_str().to_string()), ("page", page.max(1).to_string())],
                Some(token),
            )
            .await?
            .into_page())
    }

    /// Approve or reject a review. Approved reviews appear on the product
    /// page once the catalog cache expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(review = %id))]
    pub async fn moderate_review(
        &self,
        token: &str,
        id: ReviewId,
        approve: bool,
    ) -> Result<(), ApiError> {
        let action = if approve { "approve" } else { "reject" };
        self.send_empty(
            Method::POST,
            &format!("/api/superadmin/reviews/{id}/{action}"),
            Some(token),
        )
        .await?;
        info!(action, "Review moderated");
        Ok(())
    }
}
