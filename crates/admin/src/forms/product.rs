//! Product form: field checks and image naming.

use chrono::{DateTime, Utc};

use boutique_core::{CategoryId, FieldErrors, NewProduct, Price, PriceError, Product, ProductId, ProductUpdate};

/// Raw product form input, as typed by the admin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub description: String,
    pub category_id: String,
}

/// A product form that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProduct {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category_id: CategoryId,
}

impl ProductForm {
    /// Pre-fill the form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.amount().to_string(),
            description: product.description.clone(),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }

    /// Check every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns the field errors when any check fails.
    pub fn validate(&self) -> Result<ValidProduct, FieldErrors> {
        let mut errors = FieldErrors::new();

        errors.require("name", &self.name, "Le nom est requis");

        let price = match Price::parse_positive(&self.price) {
            Ok(price) => Some(price),
            Err(PriceError::Empty) => {
                errors.push("price", "Le prix est requis");
                None
            }
            Err(PriceError::NotANumber | PriceError::NotPositive) => {
                errors.push("price", "Le prix doit être un nombre positif");
                None
            }
        };

        errors.require("description", &self.description, "La description est requise");

        let category_id = if self.category_id.trim().is_empty() {
            errors.push("category_id", "La catégorie est requise");
            None
        } else if let Ok(id) = self.category_id.parse::<CategoryId>() {
            Some(id)
        } else {
            errors.push("category_id", "La catégorie est invalide");
            None
        };

        match (price, category_id) {
            (Some(price), Some(category_id)) if errors.is_empty() => Ok(ValidProduct {
                name: self.name.trim().to_string(),
                price,
                description: self.description.trim().to_string(),
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

impl ValidProduct {
    #[must_use]
    pub fn into_new(self, image_path: Option<String>) -> NewProduct {
        NewProduct {
            name: self.name,
            price: self.price,
            description: self.description,
            category_id: Some(self.category_id),
            image_path,
        }
    }

    /// Full update of the form columns. The image is only replaced when a
    /// new one was uploaded.
    #[must_use]
    pub fn into_update(self, image_path: Option<String>) -> ProductUpdate {
        ProductUpdate {
            name: Some(self.name),
            price: Some(self.price),
            description: Some(self.description),
            category_id: Some(Some(self.category_id)),
            image_path: image_path.map(Some),
        }
    }
}

/// An image picked for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImageFile {
    /// Wrap file contents, guessing the content type from the extension.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(extension(&file_name)).to_string();
        Self {
            file_name,
            bytes,
            content_type,
        }
    }

    /// Storage object name: `{owner}-{unix millis}.{ext}`.
    ///
    /// The owner is the product id when editing, otherwise the current
    /// timestamp in milliseconds.
    #[must_use]
    pub fn object_name(&self, product: Option<ProductId>, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis();
        let owner = product.map_or_else(|| millis.to_string(), |id| id.to_string());
        format!("{owner}-{millis}.{}", extension(&self.file_name))
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("size", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Text after the last dot, or the whole name when there is none.
fn extension(file_name: &str) -> &str {
    file_name.rsplit('.').next().unwrap_or(file_name)
}

fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
