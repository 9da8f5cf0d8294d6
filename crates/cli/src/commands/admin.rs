//! Back-office commands.
//!
//! # Environment Variables
//!
//! - `BOUTIQUE_ADMIN_PASSWORD` - Password for `admin login`; when unset, one
//!   line is read from stdin

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};

use boutique_admin::forms::{ImageFile, ProductForm, SettingsForm};
use boutique_admin::{
    AdminAuthService, CategoryAdminService, ProductAdminService, SettingsAdminService,
};
use boutique_core::{CategoryId, ProductId};
use boutique_storefront::AppState;

use crate::error::{CliError, Result};
use crate::output;

const PASSWORD_VAR: &str = "BOUTIQUE_ADMIN_PASSWORD";

/// Product fields given on the command line.
#[derive(Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<PathBuf>,
}

impl ProductChanges {
    fn apply_to(&mut self, form: &mut ProductForm) {
        if let Some(name) = self.name.take() {
            form.name = name;
        }
        if let Some(price) = self.price.take() {
            form.price = price;
        }
        if let Some(description) = self.description.take() {
            form.description = description;
        }
        if let Some(category) = self.category.take() {
            form.category_id = category;
        }
    }
}

/// Settings fields given on the command line.
#[derive(Debug, Default)]
pub struct SettingsChanges {
    pub shop_name: Option<String>,
    pub contact_email: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub language: Option<String>,
}

impl SettingsChanges {
    fn apply_to(self, form: &mut SettingsForm) {
        let fields = [
            (self.shop_name, &mut form.shop_name),
            (self.contact_email, &mut form.contact_email),
            (self.whatsapp, &mut form.whatsapp),
            (self.address, &mut form.address),
            (self.language, &mut form.language),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

pub async fn login(state: &AppState, email: &str) -> Result<()> {
    let password = read_password().await?;
    let session = AdminAuthService::new(state).sign_in(email, &password).await?;
    output::line(&format!(
        "Connecté en tant que {}",
        session.user.email.as_deref().unwrap_or(email)
    ));
    Ok(())
}

pub async fn logout(state: &AppState) -> Result<()> {
    AdminAuthService::new(state).sign_out().await?;
    output::line("Déconnecté");
    Ok(())
}

pub async fn create_product(state: &AppState, mut changes: ProductChanges) -> Result<()> {
    let mut form = ProductForm::default();
    changes.apply_to(&mut form);
    let image = read_image(changes.image.as_deref()).await?;

    let product = ProductAdminService::new(state).create(&form, image).await?;
    output::line(&product.id.to_string());
    Ok(())
}

pub async fn update_product(state: &AppState, id: ProductId, mut changes: ProductChanges) -> Result<()> {
    let current = state
        .catalog()
        .get_product(id)
        .await
        .ok_or(CliError::ProductNotFound(id))?;
    let mut form = ProductForm::from_product(&current);
    changes.apply_to(&mut form);
    let image = read_image(changes.image.as_deref()).await?;

    ProductAdminService::new(state).update(id, &form, image).await?;
    Ok(())
}

pub async fn delete_product(state: &AppState, id: ProductId) -> Result<()> {
    ProductAdminService::new(state).delete(id).await?;
    Ok(())
}

pub async fn add_category(state: &AppState, name: &str) -> Result<()> {
    let category = CategoryAdminService::new(state).add(name).await?;
    output::line(&category.id.to_string());
    Ok(())
}

pub async fn rename_category(state: &AppState, id: CategoryId, name: &str) -> Result<()> {
    CategoryAdminService::new(state).rename(id, name).await?;
    Ok(())
}

pub async fn delete_category(state: &AppState, id: CategoryId) -> Result<()> {
    CategoryAdminService::new(state).delete(id).await?;
    Ok(())
}

pub async fn show_settings(state: &AppState) -> Result<()> {
    output::settings(&state.settings().load_settings().await?);
    Ok(())
}

pub async fn set_settings(state: &AppState, changes: SettingsChanges) -> Result<()> {
    let service = SettingsAdminService::new(state);
    let mut form = service.form().await?;
    changes.apply_to(&mut form);
    output::settings(&service.save(form).await?);
    Ok(())
}

async fn read_password() -> Result<SecretString> {
    if let Ok(password) = std::env::var(PASSWORD_VAR) {
        return Ok(SecretString::from(password));
    }
    let line = BufReader::new(tokio::io::stdin())
        .lines()
        .next_line()
        .await
        .map_err(|source| CliError::Io {
            path: "stdin".to_string(),
            source,
        })?
        .ok_or(CliError::MissingPassword)?;
    Ok(SecretString::from(line.trim_end_matches('\r').to_string()))
}

async fn read_image(path: Option<&Path>) -> Result<Option<ImageFile>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let bytes = tokio::fs::read(path).await.map_err(|source| CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(Some(ImageFile::new(file_name, bytes)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_changes_keep_omitted_fields() {
        let mut form = ProductForm {
            name: "Casque".to_string(),
            price: "15000".to_string(),
            description: "Sans fil".to_string(),
            category_id: "c1".to_string(),
        };
        let mut changes = ProductChanges {
            price: Some("12500".to_string()),
            ..ProductChanges::default()
        };
        changes.apply_to(&mut form);
        assert_eq!(form.price, "12500");
        assert_eq!(form.name, "Casque");
        assert_eq!(form.category_id, "c1");
    }

    #[test]
    fn test_settings_changes_keep_omitted_fields() {
        let mut form = SettingsForm {
            shop_name: "TechGadget".to_string(),
            language: "fr".to_string(),
            ..SettingsForm::default()
        };
        SettingsChanges {
            language: Some("en".to_string()),
            ..SettingsChanges::default()
        }
        .apply_to(&mut form);
        assert_eq!(form.language, "en");
        assert_eq!(form.shop_name, "TechGadget");
    }

    #[tokio::test]
    async fn test_read_missing_image() {
        let err = read_image(Some(Path::new("/nonexistent/casque.png")))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
        assert!(read_image(None).await.is_ok_and(|image| image.is_none()));
    }
}
