//! Cart reconciler.
//!
//! Keeps the current actor's cart lines in memory, joined with a snapshot of
//! each product. Every mutation goes to the backend first and is followed by
//! a full re-fetch, so the in-memory list never drifts from the remote rows
//! by more than one round trip.
//!
//! Mutations are not serialized: two quick updates to the same product race
//! at the backend and the last write wins.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, instrument, warn};

use boutique_core::{ActorId, CartLine, Price, ProductId, cart_total, item_count};
use boutique_gateway::Backend;

use crate::error::{Result, ShopError};
use crate::identity::IdentityResolver;
use crate::notify::{Action, Notice, Notifier, Resource};

#[derive(Debug, Default)]
struct CartState {
    /// Actor the lines were fetched for; `None` until the first fetch.
    actor: Option<ActorId>,
    lines: Vec<CartLine>,
}

/// Actor-scoped cart kept in sync with the backend.
pub struct CartReconciler {
    backend: Arc<dyn Backend>,
    identity: IdentityResolver,
    notifier: Arc<dyn Notifier>,
    state: RwLock<CartState>,
}

impl CartReconciler {
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        identity: IdentityResolver,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            identity,
            notifier,
            state: RwLock::new(CartState::default()),
        }
    }

    /// Load every row for the current actor, replacing the in-memory list.
    ///
    /// Rows whose product no longer exists are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Load` if the rows cannot be fetched; the previous
    /// list is kept.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<Vec<CartLine>> {
        let actor = self.actor()?;
        let rows = self
            .backend
            .cart_rows(&actor)
            .await
            .map_err(|e| self.fail(ShopError::load(Resource::Cart, e)))?;

        let lines: Vec<CartLine> = rows
            .into_iter()
            .filter_map(|row| {
                let (id, product_id) = (row.id, row.product_id);
                let line = row.into_line();
                if line.is_none() {
                    warn!(cart_item_id = %id, %product_id, "Cart row references a missing product, skipping");
                }
                line
            })
            .collect();

        debug!(actor = %actor, lines = lines.len(), "Cart fetched");
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.actor = Some(actor);
        state.lines.clone_from(&lines);
        Ok(lines)
    }

    /// Add one unit of `product_id`.
    ///
    /// Increments the existing line if there is one, otherwise inserts a row
    /// with quantity 1. Only the insert sends [`Notice::ItemAdded`].
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the backend rejects the write, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: ProductId) -> Result<()> {
        let actor = self.actor()?;
        let existing = self
            .loaded_lines(&actor)
            .await?
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity);

        let write = match existing {
            Some(quantity) => {
                self.backend
                    .upsert_cart_item(&actor, product_id, quantity.saturating_add(1))
                    .await
            }
            None => self.backend.insert_cart_item(&actor, product_id, 1).await,
        };
        write.map_err(|e| self.fail(ShopError::mutation(Action::AddToCart, e)))?;

        // Only a new line is announced; an increment is silent.
        if existing.is_none() {
            info!(%product_id, "Product added to cart");
            self.notifier.notify(Notice::ItemAdded);
        } else {
            debug!(%product_id, "Cart line incremented");
        }
        self.fetch_cart().await?;
        Ok(())
    }

    /// Set the quantity of `product_id`.
    ///
    /// Quantities below 1 are ignored; the row is left as it is. Use
    /// [`remove_from_cart`](Self::remove_from_cart) to delete a line.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the backend rejects the write, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, product_id: ProductId, quantity: i64) -> Result<()> {
        if quantity < 1 {
            debug!(%product_id, quantity, "Ignoring quantity below 1");
            return Ok(());
        }
        let Ok(quantity) = u32::try_from(quantity) else {
            warn!(%product_id, quantity, "Ignoring quantity out of range");
            return Ok(());
        };

        let actor = self.actor()?;
        self.backend
            .upsert_cart_item(&actor, product_id, quantity)
            .await
            .map_err(|e| self.fail(ShopError::mutation(Action::UpdateQuantity, e)))?;

        debug!(%product_id, quantity, "Quantity updated");
        self.fetch_cart().await?;
        Ok(())
    }

    /// Remove the line for `product_id`. Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the backend rejects the delete, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<()> {
        let actor = self.actor()?;
        self.backend
            .delete_cart_item(&actor, product_id)
            .await
            .map_err(|e| self.fail(ShopError::mutation(Action::RemoveFromCart, e)))?;

        info!(%product_id, "Product removed from cart");
        self.notifier.notify(Notice::ItemRemoved);
        self.fetch_cart().await?;
        Ok(())
    }

    /// Remove every line for the current actor.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the backend rejects the delete, or
    /// `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        self.clear_rows().await?;
        self.notifier.notify(Notice::CartCleared);
        self.fetch_cart().await?;
        Ok(())
    }

    /// Clear the cart without a notice, for flows that report their own outcome.
    pub(crate) async fn clear_quietly(&self) -> Result<()> {
        self.clear_rows().await?;
        self.fetch_cart().await?;
        Ok(())
    }

    async fn clear_rows(&self) -> Result<()> {
        let actor = self.actor()?;
        self.backend
            .clear_cart_items(&actor)
            .await
            .map_err(|e| self.fail(ShopError::mutation(Action::ClearCart, e)))?;
        info!(actor = %actor, "Cart cleared");
        Ok(())
    }

    /// The lines as of the last successful fetch.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.read_state(|state| state.lines.clone())
    }

    /// Sum of `price × quantity` over the current lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.read_state(|state| cart_total(&state.lines))
    }

    /// Number of units across the current lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.read_state(|state| item_count(&state.lines))
    }

    /// Whether the in-memory list has been fetched for the current actor.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Storage` if the actor cannot be resolved.
    pub fn is_current(&self) -> Result<bool> {
        let actor = self.actor()?;
        Ok(self.read_state(|state| state.actor == Some(actor)))
    }

    fn actor(&self) -> Result<ActorId> {
        self.identity.current_actor().map_err(|e| self.fail(e))
    }

    /// The in-memory lines, fetching first if they belong to another actor.
    async fn loaded_lines(&self, actor: &ActorId) -> Result<Vec<CartLine>> {
        let cached = self.read_state(|state| {
            (state.actor.as_ref() == Some(actor)).then(|| state.lines.clone())
        });
        match cached {
            Some(lines) => Ok(lines),
            None => self.fetch_cart().await,
        }
    }

    fn read_state<T>(&self, f: impl FnOnce(&CartState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn fail(&self, err: ShopError) -> ShopError {
        err.surface(self.notifier.as_ref())
    }
}

impl std::fmt::Debug for CartReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("CartReconciler")
            .field("actor", &state.actor)
            .field("lines", &state.lines.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boutique_core::UserId;
    use boutique_gateway::{AuthProvider, AuthUser, CartStore, MemoryBackend, Session};
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::local_storage::MemoryStorage;
    use crate::notify::ChannelNotifier;

    struct Fixture {
        backend: MemoryBackend,
        cart: CartReconciler,
        notices: UnboundedReceiver<Notice>,
    }

    fn fixture() -> Fixture {
        let backend = MemoryBackend::new();
        let shared: Arc<dyn Backend> = Arc::new(backend.clone());
        let identity = IdentityResolver::new(shared.clone(), Arc::new(MemoryStorage::new()));
        let (notifier, notices) = ChannelNotifier::new();
        let cart = CartReconciler::new(shared, identity, Arc::new(notifier));
        Fixture {
            backend,
            cart,
            notices,
        }
    }

    fn drain(rx: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn test_repeated_adds_increment_one_row() {
        let f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);

        for _ in 0..5 {
            f.cart.add_to_cart(product.id).await.unwrap();
        }

        let rows: Vec<_> = f
            .backend
            .cart_items()
            .into_iter()
            .filter(|row| row.product_id == product.id)
            .collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 5);
        assert_eq!(f.cart.lines()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_only_new_lines_are_announced() {
        let mut f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);

        f.cart.add_to_cart(product.id).await.unwrap();
        assert_eq!(drain(&mut f.notices), vec![Notice::ItemAdded]);

        f.cart.add_to_cart(product.id).await.unwrap();
        f.cart.add_to_cart(product.id).await.unwrap();
        assert!(drain(&mut f.notices).is_empty());
        assert_eq!(f.cart.lines()[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_quantity_above_u32_is_ignored() {
        let f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);
        f.cart.add_to_cart(product.id).await.unwrap();

        f.cart
            .update_quantity(product.id, i64::from(u32::MAX) + 1)
            .await
            .unwrap();
        f.cart.update_quantity(product.id, i64::MAX).await.unwrap();

        let rows = f.backend.cart_items();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 1);
        assert_eq!(f.backend.calls("upsert_cart_item"), 0);
    }

    #[tokio::test]
    async fn test_quantity_below_one_is_ignored() {
        let f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);
        let other = f.backend.seed_product("Câble", Price::from_units(2_000), None);
        f.cart.add_to_cart(product.id).await.unwrap();

        f.cart.update_quantity(product.id, 0).await.unwrap();
        f.cart.update_quantity(product.id, -1).await.unwrap();
        f.cart.update_quantity(other.id, 0).await.unwrap();

        let rows = f.backend.cart_items();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 1);
        assert_eq!(f.backend.calls("upsert_cart_item"), 0);
    }

    #[tokio::test]
    async fn test_update_quantity_sets_value() {
        let f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);
        f.cart.update_quantity(product.id, 3).await.unwrap();
        assert_eq!(f.cart.item_count(), 3);
        f.cart.update_quantity(product.id, 1).await.unwrap();
        assert_eq!(f.cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_total() {
        let f = fixture();
        let a = f.backend.seed_product("A", Price::from_units(1000), None);
        let b = f.backend.seed_product("B", Price::from_units(500), None);

        f.cart.add_to_cart(a.id).await.unwrap();
        f.cart.add_to_cart(a.id).await.unwrap();
        f.cart.add_to_cart(b.id).await.unwrap();

        assert_eq!(f.cart.total(), Price::from_units(2500));
        assert_eq!(f.cart.item_count(), 3);
    }

    #[tokio::test]
    async fn test_remove_missing_product_is_noop() {
        let mut f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);
        f.cart.add_to_cart(product.id).await.unwrap();
        drain(&mut f.notices);

        f.cart.remove_from_cart(ProductId::generate()).await.unwrap();

        assert_eq!(f.cart.lines().len(), 1);
        assert_eq!(drain(&mut f.notices), vec![Notice::ItemRemoved]);
    }

    #[tokio::test]
    async fn test_clear_cart_only_touches_current_actor() {
        let mut f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);
        f.backend
            .insert_cart_item(&ActorId::Anonymous(uuid::Uuid::new_v4()), product.id, 2)
            .await
            .unwrap();
        f.cart.add_to_cart(product.id).await.unwrap();

        f.cart.clear_cart().await.unwrap();

        assert!(f.cart.lines().is_empty());
        assert_eq!(f.backend.cart_items().len(), 1);
        assert!(drain(&mut f.notices).contains(&Notice::CartCleared));
    }

    #[tokio::test]
    async fn test_login_does_not_migrate_anonymous_rows() {
        let f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);
        f.cart.add_to_cart(product.id).await.unwrap();
        let anonymous_rows = f.backend.cart_items();

        f.backend.restore_session(Session::new(
            "access",
            "refresh",
            None,
            AuthUser {
                id: UserId::generate(),
                email: None,
            },
        ));
        assert!(!f.cart.is_current().unwrap());

        let lines = f.cart.fetch_cart().await.unwrap();
        assert!(lines.is_empty());
        assert_eq!(f.backend.cart_items(), anonymous_rows);

        f.cart.add_to_cart(product.id).await.unwrap();
        assert_eq!(f.cart.lines()[0].quantity, 1);
        assert_eq!(f.backend.cart_items().len(), 2);
    }

    #[tokio::test]
    async fn test_dangling_rows_are_dropped_from_total() {
        let f = fixture();
        let kept = f.backend.seed_product("Gardé", Price::from_units(1000), None);
        let gone = f.backend.seed_product("Supprimé", Price::from_units(9000), None);
        f.cart.add_to_cart(kept.id).await.unwrap();
        f.cart.add_to_cart(gone.id).await.unwrap();

        f.backend.remove_product_row(gone.id);
        let lines = f.cart.fetch_cart().await.unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(f.cart.total(), Price::from_units(1000));
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_lines() {
        let mut f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);
        f.cart.add_to_cart(product.id).await.unwrap();
        drain(&mut f.notices);

        f.backend.fail_operation("cart_rows");
        let err = f.cart.fetch_cart().await.unwrap_err();

        assert!(matches!(err, ShopError::Load { what: Resource::Cart, .. }));
        assert_eq!(f.cart.lines().len(), 1);
        assert_eq!(
            drain(&mut f.notices),
            vec![Notice::LoadFailed(Resource::Cart)]
        );
    }

    #[tokio::test]
    async fn test_mutation_failure_is_notified() {
        let mut f = fixture();
        let product = f.backend.seed_product("Casque", Price::from_units(15_000), None);
        f.backend.fail_operation("insert_cart_item");

        let err = f.cart.add_to_cart(product.id).await.unwrap_err();

        assert_eq!(err.notice(), Notice::ActionFailed(Action::AddToCart));
        assert!(f.backend.cart_items().is_empty());
        assert_eq!(
            drain(&mut f.notices),
            vec![Notice::ActionFailed(Action::AddToCart)]
        );
    }
}
