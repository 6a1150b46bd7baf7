//! Category management, shared by merchants (their shop) and superadmins
//! (the platform-wide tree).

use bazaar_core::CategoryId;
use bazaar_core::catalog::{Category, CategoryInput};
use reqwest::Method;
use tracing::{info, instrument};

use crate::client::BackendClient;
use crate::error::ApiError;
use crate::types::Listing;

/// Which category tree a call manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryScope {
    /// The signed-in merchant's shop.
    Merchant,
    /// Platform-wide categories.
    Platform,
}

impl CategoryScope {
    const fn base_path(self) -> &'static str {
        match self {
            Self::Merchant => "/api/merchant-dashboard/categories",
            Self::Platform => "/api/superadmin/categories",
        }
    }
}

impl BackendClient {
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn managed_categories(
        &self,
        token: &str,
        scope: CategoryScope,
    ) -> Result<Vec<Category>, ApiError> {
        Ok(self
            .get::<Listing<Category>>(scope.base_path(), &[], Some(token))
            .await?
            .into_vec())
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the backend rejects the input.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn create_category(
        &self,
        token: &str,
        scope: CategoryScope,
        input: &CategoryInput,
    ) -> Result<Category, ApiError> {
        let category: Category = self.post(scope.base_path(), Some(token), input).await?;
        info!(category = %category.id, "Category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the backend rejects the input.
    #[instrument(skip(self, token, input), fields(category = %id))]
    pub async fn update_category(
        &self,
        token: &str,
        scope: CategoryScope,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<(), ApiError> {
        self.send(
            Method::PUT,
            &format!("{}/{id}", scope.base_path()),
            Some(token),
            Some(input),
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(category = %id))]
    pub async fn delete_category(
        &self,
        token: &str,
        scope: CategoryScope,
        id: CategoryId,
    ) -> Result<(), ApiError> {
        self.send_empty(
            Method::DELETE,
            &format!("{}/{id}", scope.base_path()),
            Some(token),
        )
        .await?;
        info!("Category deleted");
        Ok(())
    }
}
