//! Boutique Core - Shared types library.
//!
//! This crate provides common types used across all Boutique components:
//! - `gateway` - Client for the hosted backend (tables, auth, storage)
//! - `storefront` - Cart, catalog, settings and checkout
//! - `admin` - Back-office product/category/settings management
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, emails, actors, catalog/cart/settings records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
