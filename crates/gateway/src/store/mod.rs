//! Store traits: the seam between the storefront and the hosted backend.
//!
//! [`SupabaseClient`](crate::SupabaseClient) implements every trait against
//! the hosted tables. With the `memory` feature, `MemoryBackend` implements
//! them in-process with the same uniqueness and ordering rules.

mod remote;

use async_trait::async_trait;
use secrecy::SecretString;

use boutique_core::{
    ActorId, CartRow, Category, CategoryId, CategoryInput, Email, NewProduct, Product, ProductId,
    ProductUpdate, SettingsUpdate, ShopSettings,
};

use crate::auth::Session;
use crate::error::GatewayError;

/// Table names.
pub mod tables {
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";
    pub const CART_ITEMS: &str = "cart_items";
    pub const SETTINGS: &str = "settings";
}

/// Actor-scoped cart rows.
///
/// The table holds at most one row per `(user_id, product_id)`.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// All rows for `actor`, joined with their product.
    async fn cart_rows(&self, actor: &ActorId) -> Result<Vec<CartRow>, GatewayError>;

    /// Insert a new row; fails if one already exists for the pair.
    async fn insert_cart_item(
        &self,
        actor: &ActorId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError>;

    /// Insert or overwrite the quantity of the row keyed by `(actor, product)`.
    async fn upsert_cart_item(
        &self,
        actor: &ActorId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError>;

    /// Delete the row for `(actor, product)`; a missing row is not an error.
    async fn delete_cart_item(
        &self,
        actor: &ActorId,
        product_id: ProductId,
    ) -> Result<(), GatewayError>;

    /// Delete every row for `actor`.
    async fn clear_cart_items(&self, actor: &ActorId) -> Result<(), GatewayError>;
}

/// The `products` table.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Every product, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError>;

    /// One product; `GatewayError::NotFound` if absent.
    async fn get_product(&self, id: ProductId) -> Result<Product, GatewayError>;

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, GatewayError>;

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, GatewayError>;

    async fn delete_product(&self, id: ProductId) -> Result<(), GatewayError>;
}

/// The `categories` table.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Every category, by name ascending.
    async fn list_categories(&self) -> Result<Vec<Category>, GatewayError>;

    async fn insert_category(&self, category: &CategoryInput) -> Result<Category, GatewayError>;

    async fn update_category(
        &self,
        id: CategoryId,
        category: &CategoryInput,
    ) -> Result<Category, GatewayError>;

    /// Delete a category. Products referencing it keep the dangling id.
    async fn delete_category(&self, id: CategoryId) -> Result<(), GatewayError>;
}

/// The singleton `settings` row.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The settings row; `GatewayError::NotFound` if it is missing.
    async fn load_settings(&self) -> Result<ShopSettings, GatewayError>;

    /// Update the settings row; `GatewayError::NotFound` if it is missing.
    async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), GatewayError>;
}

/// Session-based authentication.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current session, if any.
    fn current_session(&self) -> Option<Session>;

    /// Install a session restored from local storage.
    fn restore_session(&self, session: Session);

    async fn sign_in(&self, email: &Email, password: &SecretString)
    -> Result<Session, GatewayError>;

    /// Renew the current session using its refresh token.
    async fn refresh(&self) -> Result<Session, GatewayError>;

    async fn sign_out(&self) -> Result<(), GatewayError>;
}

/// Image storage.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Public URL for a stored path; `None` for a blank path.
    fn public_url(&self, path: &str) -> Option<String>;

    /// Store `bytes` at `path` and return the path to save on the row.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError>;
}

/// Everything the storefront and admin need from the backend.
pub trait Backend:
    CartStore + ProductStore + CategoryStore + SettingsStore + AuthProvider + ObjectStorage
{
}

impl<T> Backend for T where
    T: CartStore + ProductStore + CategoryStore + SettingsStore + AuthProvider + ObjectStorage
{
}
