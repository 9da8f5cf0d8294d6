//! Back-office form checks.
//!
//! Every check runs before anything is sent, and all failures are collected
//! so the form can show them together.

mod category;
mod product;
mod settings;

pub use category::category_input;
pub use product::{ImageFile, ProductForm, ValidProduct};
pub use settings::SettingsForm;
