//! Catalog records: products and categories.
//!
//! Field names follow the hosted `products` / `categories` tables. The
//! `image_url` column actually holds an opaque storage path; it is exposed as
//! `image_path` and resolved to a public URL by the gateway.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{CategoryId, ProductId};
use crate::types::price::Price;

/// A product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    /// Nullable reference; may dangle after its category is deleted.
    pub category_id: Option<CategoryId>,
    #[serde(rename = "image_url")]
    pub image_path: Option<String>,
}

impl Product {
    /// Case-insensitive substring match on name or description.
    ///
    /// A blank term matches every product.
    #[must_use]
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

/// Insert payload for a product; id and `created_at` are server-assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category_id: Option<CategoryId>,
    #[serde(rename = "image_url")]
    pub image_path: Option<String>,
}

/// Partial update for a product. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `Some(None)` clears the category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<CategoryId>>,
    /// `Some(None)` clears the image.
    #[serde(rename = "image_url", skip_serializing_if = "Option::is_none")]
    pub image_path: Option<Option<String>>,
}

impl ProductUpdate {
    /// Apply this update to a product in place.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
        if let Some(image_path) = &self.image_path {
            product.image_path.clone_from(image_path);
        }
    }
}

/// A category row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(rename = "image_url", default)]
    pub image_path: Option<String>,
}

/// Insert/update payload for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInput {
    pub name: String,
}

/// How a product's category is shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryLabel {
    /// The referenced category exists.
    Named(String),
    /// No category, or the reference dangles.
    Uncategorized,
}

impl CategoryLabel {
    /// Resolve a product's category reference against the loaded categories.
    #[must_use]
    pub fn resolve(category_id: Option<CategoryId>, categories: &[Category]) -> Self {
        category_id
            .and_then(|id| categories.iter().find(|c| c.id == id))
            .map_or(Self::Uncategorized, |c| Self::Named(c.name.clone()))
    }
}

impl fmt::Display for CategoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Uncategorized => f.write_str("uncategorized"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(name: &str, description: &str) -> Product {
        Product {
            id: ProductId::generate(),
            created_at: Utc::now(),
            name: name.to_string(),
            price: Price::from_units(1000),
            description: description.to_string(),
            category_id: None,
            image_path: None,
        }
    }

    #[test]
    fn test_product_from_row() {
        let row = serde_json::json!({
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "created_at": "2025-03-01T10:00:00+00:00",
            "name": "Chargeur USB-C",
            "price": 7500,
            "description": "65W",
            "category_id": null,
            "image_url": "p1-1700000000000.jpg"
        });
        let product: Product = serde_json::from_value(row).unwrap();
        assert_eq!(product.price, Price::from_units(7500));
        assert_eq!(product.image_path.as_deref(), Some("p1-1700000000000.jpg"));
        assert!(product.category_id.is_none());
    }

    #[test]
    fn test_matches_search() {
        let p = product("Écouteurs Bluetooth", "Autonomie 20h");
        assert!(p.matches_search("bluetooth"));
        assert!(p.matches_search("AUTONOMIE"));
        assert!(p.matches_search("  "));
        assert!(!p.matches_search("chargeur"));
    }

    #[test]
    fn test_update_serializes_only_set_fields() {
        let update = ProductUpdate {
            price: Some(Price::from_units(900)),
            category_id: Some(None),
            ..ProductUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "price": "900", "category_id": null }));
    }

    #[test]
    fn test_update_apply_to() {
        let mut p = product("Old", "desc");
        p.category_id = Some(CategoryId::generate());
        ProductUpdate {
            name: Some("New".to_string()),
            category_id: Some(None),
            ..ProductUpdate::default()
        }
        .apply_to(&mut p);
        assert_eq!(p.name, "New");
        assert!(p.category_id.is_none());
        assert_eq!(p.description, "desc");
    }

    #[test]
    fn test_category_label_dangling_is_uncategorized() {
        let phones = Category {
            id: CategoryId::generate(),
            name: "Téléphones".to_string(),
            image_path: None,
        };
        let categories = vec![phones.clone()];
        assert_eq!(
            CategoryLabel::resolve(Some(phones.id), &categories),
            CategoryLabel::Named("Téléphones".to_string())
        );
        assert_eq!(
            CategoryLabel::resolve(Some(CategoryId::generate()), &categories),
            CategoryLabel::Uncategorized
        );
        assert_eq!(CategoryLabel::resolve(None, &categories).to_string(), "uncategorized");
    }
}
