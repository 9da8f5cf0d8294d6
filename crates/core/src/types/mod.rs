//! Core types for Boutique.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod actor;
pub mod cart;
pub mod catalog;
pub mod email;
pub mod id;
pub mod price;
pub mod settings;
pub mod validation;

pub use actor::ActorId;
pub use cart::{CartItem, CartLine, CartRow, ProductSnapshot, cart_total, item_count};
pub use catalog::{Category, CategoryInput, CategoryLabel, NewProduct, Product, ProductUpdate};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use settings::{Language, SETTINGS_ROW_ID, SettingsUpdate, ShopSettings};
pub use validation::{FieldError, FieldErrors};
