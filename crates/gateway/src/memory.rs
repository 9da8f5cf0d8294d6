//! In-memory backend.
//!
//! Holds the four tables, a user list and an object bucket in process memory,
//! enforcing the same rules as the hosted tables: one cart row per
//! `(user_id, product_id)`, products newest first, categories by name, and a
//! cart join that yields no product for dangling references.
//!
//! Failures can be injected globally or per operation to exercise error paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use boutique_core::{
    ActorId, CartItem, CartItemId, CartRow, Category, CategoryId, CategoryInput, Email,
    NewProduct, Price, Product, ProductId, ProductSnapshot, ProductUpdate, SettingsUpdate,
    ShopSettings, UserId,
};

use crate::auth::{AuthUser, Session};
use crate::config::DEFAULT_STORAGE_BUCKET;
use crate::error::GatewayError;
use crate::store::tables::{CART_ITEMS, CATEGORIES, PRODUCTS, SETTINGS};
use crate::store::{
    AuthProvider, CartStore, CategoryStore, ObjectStorage, ProductStore, SettingsStore,
};

/// Postgres unique-violation code, as surfaced by the table API.
const UNIQUE_VIOLATION: &str = "23505";

/// Session lifetime handed out by [`MemoryBackend::sign_in`].
const SESSION_SECS: i64 = 3600;

#[derive(Default)]
struct State {
    products: Vec<Product>,
    categories: Vec<Category>,
    cart: Vec<CartItem>,
    settings: Option<ShopSettings>,
    users: Vec<(String, String, AuthUser)>,
    session: Option<Session>,
    objects: HashMap<String, (Vec<u8>, String)>,
    ticks: i64,
    failing: bool,
    failing_ops: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
}

impl State {
    /// Record a call and fail it if injection is active for `op`.
    fn enter(&mut self, op: &'static str) -> Result<(), GatewayError> {
        *self.calls.entry(op).or_default() += 1;
        if self.failing || self.failing_ops.contains(op) {
            return Err(GatewayError::Api {
                status: 503,
                code: "unavailable".to_string(),
                message: format!("injected failure in {op}"),
            });
        }
        Ok(())
    }

    /// Monotonic creation timestamps so "newest first" is deterministic.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        let epoch = Utc
            .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        epoch + Duration::seconds(self.ticks)
    }

    fn snapshot(&self, product_id: ProductId) -> Option<ProductSnapshot> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| ProductSnapshot {
                name: p.name.clone(),
                price: p.price,
                image_path: p.image_path.clone(),
            })
    }
}

/// Backend that keeps everything in memory.
///
/// Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    /// Empty tables, no settings row, no users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a product.
    pub fn seed_product(
        &self,
        name: &str,
        price: Price,
        category_id: Option<CategoryId>,
    ) -> Product {
        let mut state = self.lock();
        let product = Product {
            id: ProductId::generate(),
            created_at: state.next_created_at(),
            name: name.to_string(),
            price,
            description: format!("{name} description"),
            category_id,
            image_path: None,
        };
        state.products.push(product.clone());
        product
    }

    /// Seed a category.
    pub fn seed_category(&self, name: &str) -> Category {
        let category = Category {
            id: CategoryId::generate(),
            name: name.to_string(),
            image_path: None,
        };
        self.lock().categories.push(category.clone());
        category
    }

    /// Replace the settings row (`None` removes it).
    pub fn seed_settings(&self, settings: Option<ShopSettings>) {
        self.lock().settings = settings;
    }

    /// Register a user that can sign in with `email` / `password`.
    pub fn seed_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: UserId::generate(),
            email: Some(email.to_string()),
        };
        self.lock()
            .users
            .push((email.to_string(), password.to_string(), user.clone()));
        user
    }

    /// Remove a product row directly, leaving any cart rows dangling.
    pub fn remove_product_row(&self, id: ProductId) {
        self.lock().products.retain(|p| p.id != id);
    }

    /// Fail every operation while `failing` is set.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Fail calls to one operation (by trait method name).
    pub fn fail_operation(&self, op: &'static str) {
        self.lock().failing_ops.insert(op);
    }

    /// Stop failing calls to one operation.
    pub fn restore_operation(&self, op: &'static str) {
        self.lock().failing_ops.remove(op);
    }

    /// How many times an operation (by trait method name) has been called.
    #[must_use]
    pub fn calls(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or_default()
    }

    /// Raw cart rows across all actors.
    #[must_use]
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.lock().cart.clone()
    }

    /// Current settings row.
    #[must_use]
    pub fn settings_row(&self) -> Option<ShopSettings> {
        self.lock().settings.clone()
    }

    /// Bytes and content type of an uploaded object.
    #[must_use]
    pub fn object(&self, path: &str) -> Option<(Vec<u8>, String)> {
        self.lock().objects.get(path).cloned()
    }

    fn issue_session(user: AuthUser) -> Session {
        Session::new(
            format!("memory-access-{}", Uuid::new_v4()),
            format!("memory-refresh-{}", Uuid::new_v4()),
            Some(Utc::now().timestamp() + SESSION_SECS),
            user,
        )
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryBackend")
            .field("products", &state.products.len())
            .field("categories", &state.categories.len())
            .field("cart_items", &state.cart.len())
            .field("signed_in", &state.session.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CartStore for MemoryBackend {
    async fn cart_rows(&self, actor: &ActorId) -> Result<Vec<CartRow>, GatewayError> {
        let mut state = self.lock();
        state.enter("cart_rows")?;
        let key = actor.partition_key();
        Ok(state
            .cart
            .iter()
            .filter(|item| item.user_id == key)
            .map(|item| CartRow {
                id: item.id,
                product_id: item.product_id,
                quantity: item.quantity,
                product: state.snapshot(item.product_id),
            })
            .collect())
    }

    async fn insert_cart_item(
        &self,
        actor: &ActorId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.enter("insert_cart_item")?;
        let key = actor.partition_key();
        if state
            .cart
            .iter()
            .any(|item| item.user_id == key && item.product_id == product_id)
        {
            return Err(GatewayError::Api {
                status: 409,
                code: UNIQUE_VIOLATION.to_string(),
                message: format!(
                    "duplicate key value violates unique constraint on {CART_ITEMS}"
                ),
            });
        }
        state.cart.push(CartItem {
            id: CartItemId::generate(),
            user_id: key,
            product_id,
            quantity,
        });
        Ok(())
    }

    async fn upsert_cart_item(
        &self,
        actor: &ActorId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.enter("upsert_cart_item")?;
        let key = actor.partition_key();
        if let Some(item) = state
            .cart
            .iter_mut()
            .find(|item| item.user_id == key && item.product_id == product_id)
        {
            item.quantity = quantity;
        } else {
            state.cart.push(CartItem {
                id: CartItemId::generate(),
                user_id: key,
                product_id,
                quantity,
            });
        }
        Ok(())
    }

    async fn delete_cart_item(
        &self,
        actor: &ActorId,
        product_id: ProductId,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.enter("delete_cart_item")?;
        let key = actor.partition_key();
        state
            .cart
            .retain(|item| !(item.user_id == key && item.product_id == product_id));
        Ok(())
    }

    async fn clear_cart_items(&self, actor: &ActorId) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.enter("clear_cart_items")?;
        let key = actor.partition_key();
        state.cart.retain(|item| item.user_id != key);
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryBackend {
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError> {
        let mut state = self.lock();
        state.enter("list_products")?;
        let mut products = state.products.clone();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, GatewayError> {
        let mut state = self.lock();
        state.enter("get_product")?;
        state
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("{PRODUCTS}?id=eq.{id}")))
    }

    async fn insert_product(&self, product: &NewProduct) -> Result<Product, GatewayError> {
        let mut state = self.lock();
        state.enter("insert_product")?;
        let stored = Product {
            id: ProductId::generate(),
            created_at: state.next_created_at(),
            name: product.name.clone(),
            price: product.price,
            description: product.description.clone(),
            category_id: product.category_id,
            image_path: product.image_path.clone(),
        };
        state.products.push(stored.clone());
        Ok(stored)
    }

    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, GatewayError> {
        let mut state = self.lock();
        state.enter("update_product")?;
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("{PRODUCTS}?id=eq.{id}")))?;
        update.apply_to(product);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.enter("delete_product")?;
        state.products.retain(|p| p.id != id);
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for MemoryBackend {
    async fn list_categories(&self) -> Result<Vec<Category>, GatewayError> {
        let mut state = self.lock();
        state.enter("list_categories")?;
        let mut categories = state.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_category(&self, category: &CategoryInput) -> Result<Category, GatewayError> {
        let mut state = self.lock();
        state.enter("insert_category")?;
        let stored = Category {
            id: CategoryId::generate(),
            name: category.name.clone(),
            image_path: None,
        };
        state.categories.push(stored.clone());
        Ok(stored)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        category: &CategoryInput,
    ) -> Result<Category, GatewayError> {
        let mut state = self.lock();
        state.enter("update_category")?;
        let stored = state
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("{CATEGORIES}?id=eq.{id}")))?;
        stored.name.clone_from(&category.name);
        Ok(stored.clone())
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.enter("delete_category")?;
        state.categories.retain(|c| c.id != id);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryBackend {
    async fn load_settings(&self) -> Result<ShopSettings, GatewayError> {
        let mut state = self.lock();
        state.enter("load_settings")?;
        state
            .settings
            .clone()
            .ok_or_else(|| GatewayError::NotFound(SETTINGS.to_string()))
    }

    async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.enter("update_settings")?;
        let settings = state
            .settings
            .as_mut()
            .ok_or_else(|| GatewayError::NotFound(SETTINGS.to_string()))?;
        update.apply_to(settings);
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    fn current_session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    fn restore_session(&self, session: Session) {
        self.lock().session = Some(session);
    }

    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Session, GatewayError> {
        let mut state = self.lock();
        state.enter("sign_in")?;
        let user = state
            .users
            .iter()
            .find(|(e, p, _)| {
                e.eq_ignore_ascii_case(email.as_str()) && p == password.expose_secret()
            })
            .map(|(_, _, user)| user.clone())
            .ok_or(GatewayError::InvalidCredentials)?;
        let session = Self::issue_session(user);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn refresh(&self) -> Result<Session, GatewayError> {
        let mut state = self.lock();
        let previous = state.session.take();
        state.enter("refresh")?;
        let current = previous
            .ok_or_else(|| GatewayError::Unauthorized("no session to refresh".to_string()))?;
        let session = Self::issue_session(current.user);
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        let mut state = self.lock();
        state.session = None;
        state.enter("sign_out")
    }
}

#[async_trait]
impl ObjectStorage for MemoryBackend {
    fn public_url(&self, path: &str) -> Option<String> {
        let path = path.trim();
        (!path.is_empty()).then(|| format!("memory://{DEFAULT_STORAGE_BUCKET}/{path}"))
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let mut state = self.lock();
        state.enter("upload")?;
        if state.objects.contains_key(path) {
            return Err(GatewayError::Api {
                status: 409,
                code: "Duplicate".to_string(),
                message: "The resource already exists".to_string(),
            });
        }
        state
            .objects
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(path.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn anon() -> ActorId {
        ActorId::Anonymous(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_cart_pair_is_unique() {
        let backend = MemoryBackend::new();
        let product = backend.seed_product("Casque", Price::from_units(15_000), None);
        let actor = anon();

        backend.insert_cart_item(&actor, product.id, 1).await.unwrap();
        let err = backend
            .insert_cart_item(&actor, product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Api { status: 409, .. }));

        backend.upsert_cart_item(&actor, product.id, 4).await.unwrap();
        let rows = backend.cart_rows(&actor).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 4);
    }

    #[tokio::test]
    async fn test_cart_rows_are_actor_scoped() {
        let backend = MemoryBackend::new();
        let product = backend.seed_product("Casque", Price::from_units(15_000), None);
        let (a, b) = (anon(), anon());

        backend.insert_cart_item(&a, product.id, 2).await.unwrap();
        assert!(backend.cart_rows(&b).await.unwrap().is_empty());
        backend.clear_cart_items(&b).await.unwrap();
        assert_eq!(backend.cart_rows(&a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_dangling_cart_row_has_no_product() {
        let backend = MemoryBackend::new();
        let product = backend.seed_product("Casque", Price::from_units(15_000), None);
        let actor = anon();
        backend.insert_cart_item(&actor, product.id, 1).await.unwrap();
        backend.remove_product_row(product.id);

        let rows = backend.cart_rows(&actor).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].product.is_none());
    }

    #[tokio::test]
    async fn test_listing_order() {
        let backend = MemoryBackend::new();
        backend.seed_product("Premier", Price::from_units(1), None);
        backend.seed_product("Second", Price::from_units(1), None);
        backend.seed_category("Téléphones");
        backend.seed_category("Accessoires");

        let products = backend.list_products().await.unwrap();
        assert_eq!(products[0].name, "Second");
        let categories = backend.list_categories().await.unwrap();
        assert_eq!(categories[0].name, "Accessoires");
    }

    #[tokio::test]
    async fn test_failure_injection_counts_calls() {
        let backend = MemoryBackend::new();
        backend.fail_operation("list_products");
        assert!(backend.list_products().await.is_err());
        assert!(backend.list_categories().await.is_ok());
        backend.restore_operation("list_products");
        assert!(backend.list_products().await.is_ok());
        assert_eq!(backend.calls("list_products"), 2);
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let backend = MemoryBackend::new();
        let user = backend.seed_user("admin@shop.cm", "s3cret-pass");
        let email = Email::parse("admin@shop.cm").unwrap();

        let err = backend
            .sign_in(&email, &SecretString::from("wrong".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidCredentials));

        let session = backend
            .sign_in(&email, &SecretString::from("s3cret-pass".to_string()))
            .await
            .unwrap();
        assert_eq!(session.user_id(), user.id);
        assert!(backend.current_session().is_some());

        backend.sign_out().await.unwrap();
        assert!(backend.current_session().is_none());
    }

    #[tokio::test]
    async fn test_missing_settings_row() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.load_settings().await,
            Err(GatewayError::NotFound(_))
        ));
        assert!(matches!(
            backend.update_settings(&SettingsUpdate::default()).await,
            Err(GatewayError::NotFound(_))
        ));
    }
}
