//! Settings accessor for the singleton shop settings row.
//!
//! A missing row is a load failure, not an empty state. Storefront pages
//! that only need a contact number use [`SettingsAccessor::settings_or_fallback`],
//! which substitutes hard-coded defaults instead.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, instrument, warn};

use boutique_core::{Language, SettingsUpdate, ShopSettings};
use boutique_gateway::{Backend, GatewayError};

use crate::error::{Result, ShopError};
use crate::notify::{Action, Notice, Notifier, Resource};

/// Loads and saves the shop settings row.
pub struct SettingsAccessor {
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    fallback_whatsapp: String,
    last: RwLock<Option<ShopSettings>>,
}

impl SettingsAccessor {
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
        fallback_whatsapp: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            notifier,
            fallback_whatsapp: fallback_whatsapp.into(),
            last: RwLock::new(None),
        }
    }

    /// Fetch the settings row.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Load` if the row is missing or cannot be fetched.
    #[instrument(skip(self))]
    pub async fn load_settings(&self) -> Result<ShopSettings> {
        self.fetch()
            .await
            .map_err(|e| ShopError::load(Resource::Settings, e).surface(self.notifier.as_ref()))
    }

    /// The settings row, or defaults built around the fallback number when
    /// it cannot be loaded. Never notifies.
    pub async fn settings_or_fallback(&self) -> ShopSettings {
        match self.fetch().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Settings unavailable, using defaults");
                ShopSettings::fallback(&self.fallback_whatsapp)
            }
        }
    }

    /// Update the settings row and re-fetch it.
    ///
    /// Values are saved as given; no format checks are made here.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Mutation` if the update fails (including when the
    /// row is missing), or `ShopError::Load` if the follow-up fetch fails.
    #[instrument(skip(self))]
    pub async fn save_settings(&self, update: &SettingsUpdate) -> Result<ShopSettings> {
        if update.is_empty() {
            debug!("Nothing to save");
            return self.load_settings().await;
        }

        self.backend
            .update_settings(update)
            .await
            .map_err(|e| {
                ShopError::mutation(Action::SaveSettings, e).surface(self.notifier.as_ref())
            })?;

        info!("Settings saved");
        if let Some(language) = update.language {
            self.notifier.set_language(language);
        }
        self.notifier.notify(Notice::SettingsSaved);
        self.load_settings().await
    }

    /// WhatsApp number for orders: the configured one, or the fallback.
    pub async fn whatsapp_number(&self) -> String {
        self.settings_or_fallback()
            .await
            .whatsapp_or(&self.fallback_whatsapp)
            .to_string()
    }

    /// Language of the last loaded settings, French until loaded.
    #[must_use]
    pub fn language(&self) -> Language {
        self.last
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.language)
            .unwrap_or_default()
    }

    /// The number used when settings are unavailable.
    #[must_use]
    pub fn fallback_whatsapp(&self) -> &str {
        &self.fallback_whatsapp
    }

    async fn fetch(&self) -> std::result::Result<ShopSettings, GatewayError> {
        let settings = self.backend.load_settings().await?;
        self.notifier.set_language(settings.language);
        *self.last.write().unwrap_or_else(PoisonError::into_inner) = Some(settings.clone());
        Ok(settings)
    }
}

impl std::fmt::Debug for SettingsAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsAccessor")
            .field("fallback_whatsapp", &self.fallback_whatsapp)
            .finish_non_exhaustive()
    }
}
