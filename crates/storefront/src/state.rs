//! Application state shared by every front end.

use std::sync::Arc;

use tracing::{info, instrument};

use boutique_gateway::{Backend, GatewayError, Session, SupabaseClient};

use crate::cart::CartReconciler;
use crate::catalog::Catalog;
use crate::checkout::{self, CheckoutLink};
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::identity::IdentityResolver;
use crate::local_storage::{FileStorage, LocalStorage};
use crate::notify::Notifier;
use crate::settings::SettingsAccessor;

/// Application state shared across all front ends.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend, the identity resolver and the accessors built on them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    identity: IdentityResolver,
    cart: CartReconciler,
    catalog: Catalog,
    settings: SettingsAccessor,
}

impl AppState {
    /// Wire the accessors around a backend and local storage.
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        storage: Arc<dyn LocalStorage>,
        notifier: Arc<dyn Notifier>,
        fallback_whatsapp: &str,
    ) -> Self {
        let identity = IdentityResolver::new(backend.clone(), storage);
        let cart = CartReconciler::new(backend.clone(), identity.clone(), notifier.clone());
        let catalog = Catalog::new(backend.clone(), notifier.clone());
        let settings = SettingsAccessor::new(backend.clone(), notifier.clone(), fallback_whatsapp);

        Self {
            inner: Arc::new(AppStateInner {
                backend,
                notifier,
                identity,
                cart,
                catalog,
                settings,
            }),
        }
    }

    /// Create state backed by the hosted backend and file local storage.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the HTTP client fails to build.
    pub fn from_config(
        config: &StorefrontConfig,
        notifier: Arc<dyn Notifier>,
    ) -> std::result::Result<Self, GatewayError> {
        let backend = SupabaseClient::new(&config.gateway)?;
        let storage = FileStorage::new(&config.local_storage_path);
        Ok(Self::new(
            Arc::new(backend),
            Arc::new(storage),
            notifier,
            &config.fallback_whatsapp,
        ))
    }

    /// Restore the persisted session, if any, and read the shop settings so
    /// notices render in the shop's language.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Storage` if local storage fails.
    pub async fn start(&self) -> Result<Option<Session>> {
        let session = self.inner.identity.restore_session().await?;
        self.inner.settings.settings_or_fallback().await;
        Ok(session)
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityResolver {
        &self.inner.identity
    }

    #[must_use]
    pub fn cart(&self) -> &CartReconciler {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsAccessor {
        &self.inner.settings
    }

    /// Compose the WhatsApp order for the current cart, then clear the cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::EmptyCart` for an empty cart, `ShopError::Load` if
    /// the cart cannot be fetched, or `ShopError::Mutation` if clearing fails
    /// (the link is not returned in that case).
    #[instrument(skip(self))]
    pub async fn checkout(&self) -> Result<CheckoutLink> {
        let lines = self.inner.cart.fetch_cart().await?;
        let number = self.inner.settings.whatsapp_number().await;
        let link = checkout::compose(&number, &lines)
            .map_err(|e| e.surface(self.inner.notifier.as_ref()))?;

        self.inner.cart.clear_quietly().await?;
        info!(lines = lines.len(), total = %link.total, "Order composed");
        Ok(link)
    }

    /// WhatsApp contact link for the shop.
    pub async fn contact_link(&self) -> String {
        checkout::contact_url(&self.inner.settings.whatsapp_number().await)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("identity", &self.inner.identity)
            .field("cart", &self.inner.cart)
            .field("catalog", &self.inner.catalog)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boutique_core::{Language, Price, SETTINGS_ROW_ID, ShopSettings};
    use boutique_gateway::MemoryBackend;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::error::ShopError;
    use crate::local_storage::MemoryStorage;
    use crate::notify::{ChannelNotifier, Notice, TracingNotifier};

    fn state() -> (AppState, MemoryBackend, UnboundedReceiver<Notice>) {
        let backend = MemoryBackend::new();
        let (notifier, rx) = ChannelNotifier::new();
        let state = AppState::new(
            Arc::new(backend.clone()),
            Arc::new(MemoryStorage::new()),
            Arc::new(notifier),
            "+237695959595",
        );
        (state, backend, rx)
    }

    #[tokio::test]
    async fn test_checkout_composes_and_clears() {
        let (state, backend, _rx) = state();
        backend.seed_settings(Some(ShopSettings {
            id: SETTINGS_ROW_ID,
            shop_name: "TechGadget".to_string(),
            contact_email: String::new(),
            whatsapp: "+237690000000".to_string(),
            address: String::new(),
            language: Language::French,
        }));
        let product = backend.seed_product("Casque", Price::from_units(1000), None);
        state.cart().add_to_cart(product.id).await.unwrap();
        state.cart().add_to_cart(product.id).await.unwrap();

        let link = state.checkout().await.unwrap();

        assert_eq!(link.number, "+237690000000");
        assert!(link.message.contains("Casque (x2)"));
        assert!(link.message.ends_with("Total: 2 000 FCFA"));
        assert!(state.cart().lines().is_empty());
        assert!(backend.cart_items().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_uses_fallback_number() {
        let (state, backend, _rx) = state();
        let product = backend.seed_product("Casque", Price::from_units(1000), None);
        state.cart().add_to_cart(product.id).await.unwrap();

        let link = state.checkout().await.unwrap();
        assert!(link.url.starts_with("https://wa.me/+237695959595?text="));
    }

    #[tokio::test]
    async fn test_empty_checkout_is_rejected() {
        let (state, _, mut rx) = state();
        let err = state.checkout().await.unwrap_err();
        assert!(matches!(err, ShopError::EmptyCart));
        assert_eq!(rx.try_recv().ok(), Some(Notice::EmptyCart));
    }

    #[tokio::test]
    async fn test_contact_link() {
        let (state, _, _rx) = state();
        assert!(
            state
                .contact_link()
                .await
                .starts_with("https://wa.me/+237695959595?text=Bonjour")
        );
    }

    #[tokio::test]
    async fn test_start_applies_shop_language() {
        let backend = MemoryBackend::new();
        let notifier = Arc::new(TracingNotifier::new(Language::French));
        let state = AppState::new(
            Arc::new(backend.clone()),
            Arc::new(MemoryStorage::new()),
            notifier.clone(),
            "+237695959595",
        );
        backend.seed_settings(Some(ShopSettings {
            id: SETTINGS_ROW_ID,
            shop_name: "TechGadget".to_string(),
            contact_email: String::new(),
            whatsapp: "+237690000000".to_string(),
            address: String::new(),
            language: Language::English,
        }));

        state.start().await.unwrap();

        assert_eq!(state.settings().language(), Language::English);
        assert_eq!(notifier.render(Notice::CartCleared), "Cart cleared");
    }
}
