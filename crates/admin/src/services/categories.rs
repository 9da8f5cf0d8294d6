//! Category management.

use tracing::instrument;

use boutique_core::{Category, CategoryId};
use boutique_storefront::AppState;

use crate::error::AdminError;
use crate::forms::category_input;
use crate::services::AdminAuthService;

/// Add, rename and delete categories.
pub struct CategoryAdminService<'a> {
    state: &'a AppState,
}

impl<'a> CategoryAdminService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// All categories, by name.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Shop` if the list cannot be loaded.
    pub async fn list(&self) -> Result<Vec<Category>, AdminError> {
        Ok(self.state.catalog().list_categories().await?)
    }

    /// Add a category.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` without a session,
    /// `AdminError::Validation` for a blank name, or `AdminError::Shop` if
    /// the insert fails (including a duplicate name).
    #[instrument(skip(self))]
    pub async fn add(&self, name: &str) -> Result<Category, AdminError> {
        AdminAuthService::new(self.state).require_session().await?;
        let input = category_input(name)?;
        Ok(self.state.catalog().create_category(&input).await?)
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add`].
    #[instrument(skip(self))]
    pub async fn rename(&self, id: CategoryId, name: &str) -> Result<Category, AdminError> {
        AdminAuthService::new(self.state).require_session().await?;
        let input = category_input(name)?;
        Ok(self.state.catalog().update_category(id, &input).await?)
    }

    /// Delete a category. Products that referenced it become uncategorized.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` without a session, or
    /// `AdminError::Shop` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), AdminError> {
        AdminAuthService::new(self.state).require_session().await?;
        self.state.catalog().delete_category(id).await?;
        Ok(())
    }
}
