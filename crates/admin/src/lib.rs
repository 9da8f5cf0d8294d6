//! Boutique Admin library.
//!
//! The back office: admin sign-in, and management of products, categories
//! and the shop settings. Every mutation requires a signed-in admin.
//!
//! Services borrow the storefront [`AppState`](boutique_storefront::AppState),
//! so catalog caches and notifications are shared with the shop side.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod forms;
pub mod services;

pub use error::AdminError;
pub use services::{
    AdminAuthService, CategoryAdminService, ProductAdminService, SettingsAdminService,
};
