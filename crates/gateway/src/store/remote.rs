//! Store implementations backed by the hosted tables.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, instrument};

use boutique_core::{
    ActorId, CartRow, Category, CategoryId, CategoryInput, Email, NewProduct, Product, ProductId,
    ProductUpdate, SETTINGS_ROW_ID, SettingsUpdate, ShopSettings,
};

use super::tables::{CART_ITEMS, CATEGORIES, PRODUCTS, SETTINGS};
use super::{AuthProvider, CartStore, CategoryStore, ObjectStorage, ProductStore, SettingsStore};
use crate::auth::Session;
use crate::client::SupabaseClient;
use crate::error::GatewayError;
use crate::query::Order;

/// Cart projection with the product join.
const CART_SELECT: &str = "id,product_id,quantity,product:products(name,price,image_url)";

/// Columns identifying a cart row for upserts.
const CART_KEY: &str = "user_id,product_id";

#[derive(Serialize)]
struct CartItemBody<'a> {
    user_id: &'a str,
    product_id: ProductId,
    quantity: u32,
}

#[async_trait]
impl CartStore for SupabaseClient {
    #[instrument(skip(self))]
    async fn cart_rows(&self, actor: &ActorId) -> Result<Vec<CartRow>, GatewayError> {
        self.from(CART_ITEMS)
            .select(CART_SELECT)
            .eq("user_id", actor)
            .fetch()
            .await
    }

    #[instrument(skip(self))]
    async fn insert_cart_item(
        &self,
        actor: &ActorId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        let key = actor.partition_key();
        self.from(CART_ITEMS)
            .insert(&CartItemBody {
                user_id: &key,
                product_id,
                quantity,
            })
            .await
    }

    #[instrument(skip(self))]
    async fn upsert_cart_item(
        &self,
        actor: &ActorId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), GatewayError> {
        let key = actor.partition_key();
        self.from(CART_ITEMS)
            .on_conflict(CART_KEY)
            .upsert(&CartItemBody {
                user_id: &key,
                product_id,
                quantity,
            })
            .await
    }

    #[instrument(skip(self))]
    async fn delete_cart_item(
        &self,
        actor: &ActorId,
        product_id: ProductId,
    ) -> Result<(), GatewayError> {
        self.from(CART_ITEMS)
            .eq("user_id", actor)
            .eq("product_id", product_id)
            .delete()
            .await
    }

    #[instrument(skip(self))]
    async fn clear_cart_items(&self, actor: &ActorId) -> Result<(), GatewayError> {
        self.from(CART_ITEMS).eq("user_id", actor).delete().await
    }
}

#[async_trait]
impl ProductStore for SupabaseClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, GatewayError> {
        let products: Vec<Product> = self
            .from(PRODUCTS)
            .select("*")
            .order("created_at", Order::Descending)
            .fetch()
            .await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> Result<Product, GatewayError> {
        self.from(PRODUCTS)
            .select("*")
            .eq("id", id)
            .fetch_single()
            .await
    }

    #[instrument(skip(self))]
    async fn insert_product(&self, product: &NewProduct) -> Result<Product, GatewayError> {
        self.from(PRODUCTS)
            .select("*")
            .insert_returning(product)
            .await
    }

    #[instrument(skip(self))]
    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, GatewayError> {
        self.from(PRODUCTS)
            .select("*")
            .eq("id", id)
            .update_returning(update)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: ProductId) -> Result<(), GatewayError> {
        self.from(PRODUCTS).eq("id", id).delete().await
    }
}

#[async_trait]
impl CategoryStore for SupabaseClient {
    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, GatewayError> {
        self.from(CATEGORIES)
            .select("*")
            .order("name", Order::Ascending)
            .fetch()
            .await
    }

    #[instrument(skip(self))]
    async fn insert_category(&self, category: &CategoryInput) -> Result<Category, GatewayError> {
        self.from(CATEGORIES)
            .select("*")
            .insert_returning(category)
            .await
    }

    #[instrument(skip(self))]
    async fn update_category(
        &self,
        id: CategoryId,
        category: &CategoryInput,
    ) -> Result<Category, GatewayError> {
        self.from(CATEGORIES)
            .select("*")
            .eq("id", id)
            .update_returning(category)
            .await
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: CategoryId) -> Result<(), GatewayError> {
        self.from(CATEGORIES).eq("id", id).delete().await
    }
}

#[async_trait]
impl SettingsStore for SupabaseClient {
    #[instrument(skip(self))]
    async fn load_settings(&self) -> Result<ShopSettings, GatewayError> {
        self.from(SETTINGS)
            .select("*")
            .eq("id", SETTINGS_ROW_ID)
            .fetch_single()
            .await
    }

    #[instrument(skip(self))]
    async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), GatewayError> {
        let changed = self
            .from(SETTINGS)
            .eq("id", SETTINGS_ROW_ID)
            .update(update)
            .await?;
        if changed == 0 {
            return Err(GatewayError::NotFound(format!(
                "{SETTINGS}?id=eq.{SETTINGS_ROW_ID}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    fn current_session(&self) -> Option<Session> {
        self.session()
    }

    fn restore_session(&self, session: Session) {
        self.set_session(Some(session));
    }

    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Session, GatewayError> {
        self.sign_in_with_password(email, password).await
    }

    async fn refresh(&self) -> Result<Session, GatewayError> {
        self.refresh_session().await
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        Self::sign_out(self).await
    }
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    fn public_url(&self, path: &str) -> Option<String> {
        Self::public_url(self, path)
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        self.upload_object(path, bytes, content_type).await
    }
}
