//! Boutique Storefront library.
//!
//! The shopper-facing half of Boutique: who the visitor is, what is in their
//! cart, what the catalog holds, and how an order is handed to WhatsApp.
//! Front ends construct an [`AppState`](state::AppState) and drive it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod identity;
pub mod local_storage;
pub mod notify;
pub mod settings;
pub mod state;

pub use error::{Result, ShopError};
pub use state::AppState;
