//! Back-office services.
//!
//! # Services
//!
//! - `auth` - Email/password sign-in and the session guard
//! - `products` - Product create/edit/delete with image upload
//! - `categories` - Category add/rename/delete
//! - `settings` - Shop settings form

pub mod auth;
pub mod categories;
pub mod products;
pub mod settings;

pub use auth::AdminAuthService;
pub use categories::CategoryAdminService;
pub use products::ProductAdminService;
pub use settings::SettingsAdminService;
