//! Catalog accessors for products and categories.
//!
//! Listings are fetched whole (no pagination) on every call. Concurrent reads
//! of the same listing or product share one backend request through a `moka`
//! cache; the shared entry is dropped as soon as that request completes, so
//! a read never returns data older than its own round trip. Every successful
//! create/update/delete re-fetches the full collection.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, info, instrument, warn};

use boutique_core::{
    Category, CategoryId, CategoryInput, CategoryLabel, NewProduct, Product, ProductId,
    ProductUpdate,
};
use boutique_gateway::{Backend, GatewayError};

use crate::error::{Result, ShopError};
use crate::notify::{Action, Notice, Notifier, Resource};

/// Upper bound on products being fetched at once by id.
const MAX_IN_FLIGHT_PRODUCTS: u64 = 1_000;

/// Hard limit on how long a shared result may linger if its request is
/// cancelled before the entry is dropped.
const SHARE_WINDOW: Duration = Duration::from_secs(2);

/// Filters for browsing the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Only products in this category.
    pub category: Option<CategoryId>,
    /// Case-insensitive substring of the name or description.
    pub search: Option<String>,
}

impl CatalogQuery {
    /// Whether `product` passes both filters.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let in_category = self
            .category
            .is_none_or(|id| product.category_id == Some(id));
        let found = self
            .search
            .as_deref()
            .is_none_or(|term| product.matches_search(term));
        in_category && found
    }
}

/// A product as shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub product: Product,
    pub category: CategoryLabel,
    /// Public URL of the product image, if it has one.
    pub image_url: Option<String>,
}

/// Access to products and categories.
///
/// Cheap to clone; clones share in-flight requests.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    products: Cache<(), Vec<Product>>,
    product: Cache<ProductId, Product>,
    categories: Cache<(), Vec<Category>>,
}

fn in_flight<K, V>(capacity: u64) -> Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(capacity)
        .time_to_live(SHARE_WINDOW)
        .build()
}

/// Run `fetch` for `key`, or join a fetch already running for it.
///
/// The entry is removed once the fetch completes, so the next call goes to
/// the backend again.
async fn coalesce<K, V, F>(
    cache: &Cache<K, V>,
    key: K,
    fetch: F,
) -> std::result::Result<V, GatewayError>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    F: Future<Output = std::result::Result<V, GatewayError>>,
{
    let outcome = cache.try_get_with(key.clone(), fetch).await;
    cache.invalidate(&key).await;
    outcome.map_err(GatewayError::unshare)
}

impl Catalog {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(CatalogInner {
                backend,
                notifier,
                products: in_flight(1),
                product: in_flight(MAX_IN_FLIGHT_PRODUCTS),
                categories: in_flight(1),
            }),
        }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Load` if the products cannot be fetched.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let backend = &self.inner.backend;
        let products = coalesce(&self.inner.products, (), backend.list_products())
            .await
            .map_err(|e| self.fail(ShopError::load(Resource::Products, e)))?;
        debug!(count = products.len(), "Products fetched");
        Ok(products)
    }

    /// One product, or `None` if it does not exist or cannot be fetched.
    ///
    /// Failures are logged and notified, never returned.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Option<Product> {
        let backend = &self.inner.backend;
        match coalesce(&self.inner.product, id, backend.get_product(id)).await {
            Ok(product) => Some(product),
            Err(e) if e.is_not_found() => {
                debug!(error = %e, "Product not found");
                None
            }
            Err(e) => {
                let _ = self.fail(ShopError::load(Resource::Product, e));
                None
            }
        }
    }

    /// Products passing `query`, each with its category label and image URL.
    ///
    /// If categories cannot be loaded every product is labeled uncategorized.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Load` if the products cannot be fetched.
    #[instrument(skip(self))]
    pub async fn browse(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>> {
        let products = self.list_products().await?;
        let categories = match self.list_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                warn!(error = %e, "Browsing without category names");
                Vec::new()
            }
        };

        Ok(products
            .into_iter()
            .filter(|product| query.matches(product))
            .map(|product| CatalogEntry {
                category: CategoryLabel::resolve(product.category_id, &categories),
                image_url: self.image_url(product.image_path.as_deref()),
                product,
            })
            .collect())
    }

    /// Create a product and re-fetch the listing.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the insert fails, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product> {
        let created = self
            .inner
            .backend
            .insert_product(product)
            .await
            .map_err(|e| self.fail(ShopError::mutation(Action::CreateProduct, e)))?;

        info!(product_id = %created.id, "Product created");
        self.inner.notifier.notify(Notice::ProductCreated);
        self.list_products().await?;
        Ok(created)
    }

    /// Update a product and re-fetch the listing.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the update fails, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self, update))]
    pub async fn update_product(&self, id: ProductId, update: &ProductUpdate) -> Result<Product> {
        let updated = self
            .inner
            .backend
            .update_product(id, update)
            .await
            .map_err(|e| self.fail(ShopError::mutation(Action::UpdateProduct, e)))?;

        info!(product_id = %id, "Product updated");
        self.inner.notifier.notify(Notice::ProductUpdated);
        self.list_products().await?;
        Ok(updated)
    }

    /// Delete a product and re-fetch the listing.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the delete fails, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        self.inner
            .backend
            .delete_product(id)
            .await
            .map_err(|e| self.fail(ShopError::mutation(Action::DeleteProduct, e)))?;

        info!(product_id = %id, "Product deleted");
        self.inner.notifier.notify(Notice::ProductDeleted);
        self.list_products().await?;
        Ok(())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Every category, by name.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Load` if the categories cannot be fetched.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let backend = &self.inner.backend;
        let categories = coalesce(&self.inner.categories, (), backend.list_categories())
            .await
            .map_err(|e| self.fail(ShopError::load(Resource::Categories, e)))?;
        debug!(count = categories.len(), "Categories fetched");
        Ok(categories)
    }

    /// Create a category and re-fetch the listing.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the insert fails, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn create_category(&self, category: &CategoryInput) -> Result<Category> {
        let created = self
            .inner
            .backend
            .insert_category(category)
            .await
            .map_err(|e| self.fail(ShopError::mutation(Action::CreateCategory, e)))?;

        info!(category_id = %created.id, "Category created");
        self.inner.notifier.notify(Notice::CategoryCreated);
        self.list_categories().await?;
        Ok(created)
    }

    /// Rename a category and re-fetch the listing.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the update fails, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        category: &CategoryInput,
    ) -> Result<Category> {
        let updated = self
            .inner
            .backend
            .update_category(id, category)
            .await
            .map_err(|e| self.fail(ShopError::mutation(Action::UpdateCategory, e)))?;

        info!(category_id = %id, "Category updated");
        self.inner.notifier.notify(Notice::CategoryUpdated);
        self.list_categories().await?;
        Ok(updated)
    }

    /// Delete a category and re-fetch the listing.
    ///
    /// Products referencing it are left alone and list as uncategorized.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the delete fails, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        self.inner
            .backend
            .delete_category(id)
            .await
            .map_err(|e| self.fail(ShopError::mutation(Action::DeleteCategory, e)))?;

        info!(category_id = %id, "Category deleted");
        self.inner.notifier.notify(Notice::CategoryDeleted);
        self.list_categories().await?;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Public URL for an image path.
    #[must_use]
    pub fn image_url(&self, path: Option<&str>) -> Option<String> {
        path.and_then(|p| self.inner.backend.public_url(p))
    }

    fn fail(&self, err: ShopError) -> ShopError {
        err.surface(self.inner.notifier.as_ref())
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("products_in_flight", &self.inner.product.entry_count())
            .finish_non_exhaustive()
    }
}
