//! Shop-wide settings (singleton row).

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Id of the single `settings` row.
pub const SETTINGS_ROW_ID: i64 = 1;

/// Interface language of the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    French,
    English,
}

impl Language {
    /// Map a stored language code; unknown codes fall back to French.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Self::English,
            _ => Self::French,
        }
    }

    /// Two-letter code stored in the settings row.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::French => "fr",
            Self::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = Option::<String>::deserialize(deserializer)?;
        Ok(code.as_deref().map_or_else(Self::default, Self::from_code))
    }
}

/// The `settings` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSettings {
    pub id: i64,
    #[serde(default)]
    pub shop_name: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub whatsapp: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub language: Language,
}

impl ShopSettings {
    /// Hard-coded values used while settings are missing or failed to load.
    #[must_use]
    pub fn fallback(whatsapp: &str) -> Self {
        Self {
            id: SETTINGS_ROW_ID,
            shop_name: String::new(),
            contact_email: String::new(),
            whatsapp: whatsapp.to_string(),
            address: String::new(),
            language: Language::default(),
        }
    }

    /// The configured WhatsApp number, or `fallback` when blank.
    #[must_use]
    pub fn whatsapp_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        let number = self.whatsapp.trim();
        if number.is_empty() { fallback } else { number }
    }
}

/// Partial update of the settings row. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl SettingsUpdate {
    /// Whether no column would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.shop_name.is_none()
            && self.contact_email.is_none()
            && self.whatsapp.is_none()
            && self.address.is_none()
            && self.language.is_none()
    }

    /// Apply this update to a settings row in place.
    pub fn apply_to(&self, settings: &mut ShopSettings) {
        if let Some(v) = &self.shop_name {
            settings.shop_name.clone_from(v);
        }
        if let Some(v) = &self.contact_email {
            settings.contact_email.clone_from(v);
        }
        if let Some(v) = &self.whatsapp {
            settings.whatsapp.clone_from(v);
        }
        if let Some(v) = &self.address {
            settings.address.clone_from(v);
        }
        if let Some(v) = self.language {
            settings.language = v;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_row() {
        let row = serde_json::json!({
            "id": 1,
            "shop_name": "TechGadget",
            "contact_email": "contact@techgadget.cm",
            "whatsapp": "+237690000000",
            "address": "Douala",
            "language": "en"
        });
        let settings: ShopSettings = serde_json::from_value(row).unwrap();
        assert_eq!(settings.language, Language::English);
        assert_eq!(settings.whatsapp_or("+1"), "+237690000000");
    }

    #[test]
    fn test_null_or_unknown_language_is_french() {
        let row = serde_json::json!({ "id": 1, "language": null });
        let settings: ShopSettings = serde_json::from_value(row).unwrap();
        assert_eq!(settings.language, Language::French);
        assert_eq!(Language::from_code("de"), Language::French);
    }

    #[test]
    fn test_blank_whatsapp_uses_fallback() {
        let mut settings = ShopSettings::fallback("+237695959595");
        settings.whatsapp = "  ".to_string();
        assert_eq!(settings.whatsapp_or("+237695959595"), "+237695959595");
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = SettingsUpdate {
            whatsapp: Some("+237600000000".to_string()),
            language: Some(Language::English),
            ..SettingsUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "whatsapp": "+237600000000", "language": "en" })
        );
        assert!(SettingsUpdate::default().is_empty());
    }
}
