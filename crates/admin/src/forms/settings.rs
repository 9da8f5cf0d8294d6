//! Settings form.
//!
//! Values are saved as typed. The only check is that the language is one the
//! shop supports.

use boutique_core::{FieldErrors, Language, SettingsUpdate, ShopSettings};

/// Raw settings form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub shop_name: String,
    pub contact_email: String,
    pub whatsapp: String,
    pub address: String,
    /// `fr` or `en`.
    pub language: String,
}

impl SettingsForm {
    /// Pre-fill the form from the stored row.
    #[must_use]
    pub fn from_settings(settings: &ShopSettings) -> Self {
        Self {
            shop_name: settings.shop_name.clone(),
            contact_email: settings.contact_email.clone(),
            whatsapp: settings.whatsapp.clone(),
            address: settings.address.clone(),
            language: settings.language.code().to_string(),
        }
    }

    /// Build a full update of every column.
    ///
    /// # Errors
    ///
    /// Returns a `language` field error for anything but `fr` or `en`.
    pub fn into_update(self) -> Result<SettingsUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let language = match self.language.trim().to_ascii_lowercase().as_str() {
            "fr" => Language::French,
            "en" => Language::English,
            _ => {
                errors.push("language", "Langue non prise en charge");
                Language::default()
            }
        };
        errors.into_result(SettingsUpdate {
            shop_name: Some(self.shop_name),
            contact_email: Some(self.contact_email),
            whatsapp: Some(self.whatsapp),
            address: Some(self.address),
            language: Some(language),
        })
    }
}
