//! User-facing notifications.
//!
//! Operations that a shopper or admin triggers report their outcome as a
//! [`Notice`] through a [`Notifier`], in addition to returning a `Result`.
//! A notice renders as a short message in the shop's language.

use std::sync::{PoisonError, RwLock};

use boutique_core::Language;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// A collection the storefront loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Cart,
    Products,
    Product,
    Categories,
    Settings,
}

impl Resource {
    /// Name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::Products => "products",
            Self::Product => "product",
            Self::Categories => "categories",
            Self::Settings => "settings",
        }
    }
}

/// A mutation the storefront or back office performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    AddToCart,
    UpdateQuantity,
    RemoveFromCart,
    ClearCart,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    SaveSettings,
    UploadImage,
}

impl Action {
    /// Name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddToCart => "add to cart",
            Self::UpdateQuantity => "update quantity",
            Self::RemoveFromCart => "remove from cart",
            Self::ClearCart => "clear cart",
            Self::CreateProduct => "create product",
            Self::UpdateProduct => "update product",
            Self::DeleteProduct => "delete product",
            Self::CreateCategory => "create category",
            Self::UpdateCategory => "update category",
            Self::DeleteCategory => "delete category",
            Self::SaveSettings => "save settings",
            Self::UploadImage => "upload image",
        }
    }
}

/// Outcome of a user-triggered operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    ItemAdded,
    ItemRemoved,
    CartCleared,
    ProductCreated,
    ProductUpdated,
    ProductDeleted,
    CategoryCreated,
    CategoryUpdated,
    CategoryDeleted,
    SettingsSaved,
    LoadFailed(Resource),
    ActionFailed(Action),
    InvalidForm,
    EmptyCart,
    StorageUnavailable,
}

impl Notice {
    /// Whether this notice reports a failure.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            Self::LoadFailed(_)
                | Self::ActionFailed(_)
                | Self::InvalidForm
                | Self::EmptyCart
                | Self::StorageUnavailable
        )
    }

    /// The message shown to the user.
    #[must_use]
    pub const fn message(self, language: Language) -> &'static str {
        match language {
            Language::French => self.french(),
            Language::English => self.english(),
        }
    }

    const fn french(self) -> &'static str {
        match self {
            Self::ItemAdded => "Produit ajouté au panier",
            Self::ItemRemoved => "Produit retiré du panier",
            Self::CartCleared => "Panier vidé",
            Self::ProductCreated => "Produit ajouté avec succès",
            Self::ProductUpdated => "Produit mis à jour avec succès",
            Self::ProductDeleted => "Produit supprimé avec succès",
            Self::CategoryCreated => "Catégorie ajoutée avec succès",
            Self::CategoryUpdated => "Catégorie mise à jour avec succès",
            Self::CategoryDeleted => "Catégorie supprimée avec succès",
            Self::SettingsSaved => "Paramètres enregistrés avec succès",
            Self::LoadFailed(Resource::Cart) => "Erreur lors du chargement du panier",
            Self::LoadFailed(Resource::Products) => "Erreur de chargement des produits",
            Self::LoadFailed(Resource::Product) => "Erreur de chargement du produit",
            Self::LoadFailed(Resource::Categories) => "Erreur de chargement des catégories",
            Self::LoadFailed(Resource::Settings) => "Erreur de chargement des paramètres",
            Self::ActionFailed(Action::AddToCart) => "Erreur lors de l'ajout au panier",
            Self::ActionFailed(Action::UpdateQuantity) => "Erreur lors de la mise à jour",
            Self::ActionFailed(Action::RemoveFromCart) => "Erreur lors de la suppression",
            Self::ActionFailed(Action::ClearCart) => "Erreur lors de la suppression du panier",
            Self::ActionFailed(Action::CreateProduct) => "Erreur lors de la création du produit",
            Self::ActionFailed(Action::UpdateProduct) => {
                "Erreur lors de la mise à jour du produit"
            }
            Self::ActionFailed(Action::DeleteProduct) => {
                "Erreur lors de la suppression du produit"
            }
            Self::ActionFailed(Action::CreateCategory) => {
                "Erreur lors de la création de la catégorie"
            }
            Self::ActionFailed(Action::UpdateCategory) => {
                "Erreur lors de la mise à jour de la catégorie"
            }
            Self::ActionFailed(Action::DeleteCategory) => {
                "Erreur lors de la suppression de la catégorie"
            }
            Self::ActionFailed(Action::SaveSettings) => {
                "Erreur lors de l'enregistrement des paramètres"
            }
            Self::ActionFailed(Action::UploadImage) => "Erreur lors de l'envoi de l'image",
            Self::InvalidForm => "Veuillez corriger les champs en erreur",
            Self::EmptyCart => "Votre panier est vide",
            Self::StorageUnavailable => "Stockage local indisponible",
        }
    }

    const fn english(self) -> &'static str {
        match self {
            Self::ItemAdded => "Product added to cart",
            Self::ItemRemoved => "Product removed from cart",
            Self::CartCleared => "Cart cleared",
            Self::ProductCreated => "Product created",
            Self::ProductUpdated => "Product updated",
            Self::ProductDeleted => "Product deleted",
            Self::CategoryCreated => "Category created",
            Self::CategoryUpdated => "Category updated",
            Self::CategoryDeleted => "Category deleted",
            Self::SettingsSaved => "Settings saved",
            Self::LoadFailed(Resource::Cart) => "Could not load the cart",
            Self::LoadFailed(Resource::Products) => "Could not load products",
            Self::LoadFailed(Resource::Product) => "Could not load the product",
            Self::LoadFailed(Resource::Categories) => "Could not load categories",
            Self::LoadFailed(Resource::Settings) => "Could not load settings",
            Self::ActionFailed(Action::AddToCart) => "Could not add the product to the cart",
            Self::ActionFailed(Action::UpdateQuantity) => "Could not update the quantity",
            Self::ActionFailed(Action::RemoveFromCart) => "Could not remove the product",
            Self::ActionFailed(Action::ClearCart) => "Could not clear the cart",
            Self::ActionFailed(Action::CreateProduct) => "Could not create the product",
            Self::ActionFailed(Action::UpdateProduct) => "Could not update the product",
            Self::ActionFailed(Action::DeleteProduct) => "Could not delete the product",
            Self::ActionFailed(Action::CreateCategory) => "Could not create the category",
            Self::ActionFailed(Action::UpdateCategory) => "Could not update the category",
            Self::ActionFailed(Action::DeleteCategory) => "Could not delete the category",
            Self::ActionFailed(Action::SaveSettings) => "Could not save settings",
            Self::ActionFailed(Action::UploadImage) => "Could not upload the image",
            Self::InvalidForm => "Please fix the highlighted fields",
            Self::EmptyCart => "Your cart is empty",
            Self::StorageUnavailable => "Local storage is unavailable",
        }
    }
}

/// Receives notices for display.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    /// Switch the language later notices render in. Called whenever the
    /// shop settings are read.
    fn set_language(&self, _language: Language) {}
}

/// Writes notices to the log in the shop's current language.
#[derive(Debug, Default)]
pub struct TracingNotifier {
    language: RwLock<Language>,
}

impl TracingNotifier {
    #[must_use]
    pub const fn new(language: Language) -> Self {
        Self {
            language: RwLock::new(language),
        }
    }

    pub fn language(&self) -> Language {
        *self.language.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// The text a notice is logged with.
    pub fn render(&self, notice: Notice) -> &'static str {
        notice.message(self.language())
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let message = self.render(notice);
        if notice.is_error() {
            warn!(?notice, "{message}");
        } else {
            info!(?notice, "{message}");
        }
    }

    fn set_language(&self, language: Language) {
        *self.language.write().unwrap_or_else(PoisonError::into_inner) = language;
    }
}

/// Forwards notices to a consumer over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end for the consumer.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            debug!(?notice, "Notice dropped, receiver is gone");
        }
    }
}
