//! Product management.

use chrono::Utc;
use tracing::{info, instrument};

use boutique_core::{Product, ProductId};
use boutique_storefront::notify::Action;
use boutique_storefront::{AppState, ShopError};

use crate::error::AdminError;
use crate::forms::{ImageFile, ProductForm};
use crate::services::AdminAuthService;

/// Create, edit and delete products.
pub struct ProductAdminService<'a> {
    state: &'a AppState,
}

impl<'a> ProductAdminService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Shop` if the list cannot be loaded.
    pub async fn list(&self) -> Result<Vec<Product>, AdminError> {
        Ok(self.state.catalog().list_products().await?)
    }

    /// Create a product, uploading its image first when one is given.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` without a session,
    /// `AdminError::Validation` if the form is invalid, or `AdminError::Shop`
    /// if the upload or insert fails.
    #[instrument(skip(self, form, image))]
    pub async fn create(
        &self,
        form: &ProductForm,
        image: Option<ImageFile>,
    ) -> Result<Product, AdminError> {
        AdminAuthService::new(self.state).require_session().await?;
        let valid = form.validate()?;

        let image_path = match image {
            Some(image) => Some(self.upload(image, None).await?),
            None => None,
        };
        let product = self
            .state
            .catalog()
            .create_product(&valid.into_new(image_path))
            .await?;
        Ok(product)
    }

    /// Replace a product's fields. The current image is kept unless a new
    /// one is given.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create`].
    #[instrument(skip(self, form, image))]
    pub async fn update(
        &self,
        id: ProductId,
        form: &ProductForm,
        image: Option<ImageFile>,
    ) -> Result<Product, AdminError> {
        AdminAuthService::new(self.state).require_session().await?;
        let valid = form.validate()?;

        let image_path = match image {
            Some(image) => Some(self.upload(image, Some(id)).await?),
            None => None,
        };
        let product = self
            .state
            .catalog()
            .update_product(id, &valid.into_update(image_path))
            .await?;
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` without a session, or
    /// `AdminError::Shop` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), AdminError> {
        AdminAuthService::new(self.state).require_session().await?;
        self.state.catalog().delete_product(id).await?;
        Ok(())
    }

    async fn upload(&self, image: ImageFile, product: Option<ProductId>) -> Result<String, ShopError> {
        let name = image.object_name(product, Utc::now());
        let path = self
            .state
            .backend()
            .upload(&name, image.bytes, &image.content_type)
            .await
            .map_err(|e| {
                ShopError::mutation(Action::UploadImage, e).surface(self.state.notifier().as_ref())
            })?;
        info!(path = %path, "Product image uploaded");
        Ok(path)
    }
}
