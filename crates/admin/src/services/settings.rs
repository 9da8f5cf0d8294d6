//! Shop settings management.

use tracing::instrument;

use boutique_core::ShopSettings;
use boutique_storefront::AppState;

use crate::error::AdminError;
use crate::forms::SettingsForm;
use crate::services::AdminAuthService;

/// Load and save the shop settings row.
pub struct SettingsAdminService<'a> {
    state: &'a AppState,
}

impl<'a> SettingsAdminService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// The stored settings, as a pre-filled form.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Shop` if the row is missing or cannot be loaded.
    pub async fn form(&self) -> Result<SettingsForm, AdminError> {
        let settings = self.state.settings().load_settings().await?;
        Ok(SettingsForm::from_settings(&settings))
    }

    /// Save every field of `form`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` without a session,
    /// `AdminError::Validation` for an unsupported language, or
    /// `AdminError::Shop` if the update fails.
    #[instrument(skip(self, form))]
    pub async fn save(&self, form: SettingsForm) -> Result<ShopSettings, AdminError> {
        AdminAuthService::new(self.state).require_session().await?;
        let update = form.into_update()?;
        Ok(self.state.settings().save_settings(&update).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use boutique_core::Language;
    use boutique_gateway::MemoryBackend;
    use boutique_storefront::local_storage::MemoryStorage;
    use boutique_storefront::notify::TracingNotifier;
    use secrecy::SecretString;

    use super::*;

    fn state(backend: &MemoryBackend) -> AppState {
        AppState::new(
            Arc::new(backend.clone()),
            Arc::new(MemoryStorage::new()),
            Arc::new(TracingNotifier::default()),
            "+237695959595",
        )
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let backend = MemoryBackend::new();
        backend.seed_user("admin@techgadget.cm", "s3cret-pass");
        backend.seed_settings(Some(ShopSettings::fallback("+237690000000")));
        let state = state(&backend);
        AdminAuthService::new(&state)
            .sign_in(
                "admin@techgadget.cm",
                &SecretString::from("s3cret-pass".to_string()),
            )
            .await
            .unwrap();
        let service = SettingsAdminService::new(&state);

        let mut form = service.form().await.unwrap();
        form.shop_name = "TechGadget".to_string();
        form.language = "en".to_string();
        let saved = service.save(form).await.unwrap();

        assert_eq!(saved.shop_name, "TechGadget");
        assert_eq!(saved.whatsapp, "+237690000000");
        assert_eq!(saved.language, Language::English);
        assert_eq!(backend.settings_row(), Some(saved));
    }

    #[tokio::test]
    async fn test_save_requires_session() {
        let backend = MemoryBackend::new();
        backend.seed_settings(Some(ShopSettings::fallback("+237690000000")));
        let state = state(&backend);

        let err = SettingsAdminService::new(&state)
            .save(SettingsForm::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Unauthorized));
        assert_eq!(backend.calls("update_settings"), 0);
    }
}
