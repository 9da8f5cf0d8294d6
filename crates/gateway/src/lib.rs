//! Boutique Gateway - client for the hosted backend.
//!
//! The shop keeps all of its durable state in a hosted backend exposing three
//! APIs over HTTP:
//!
//! - a table API (`rest/v1`) for products, categories, cart items and settings
//! - an auth API (`auth/v1`) for password sign-in and session refresh
//! - object storage (`storage/v1`) for product images
//!
//! [`SupabaseClient`] speaks all three. The [`store`] traits describe what the
//! rest of the workspace needs from the backend; the client implements them,
//! and so does `MemoryBackend` (feature `memory`) for tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod query;
pub mod storage;
pub mod store;

pub use auth::{AuthUser, Session};
pub use client::SupabaseClient;
pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
#[cfg(feature = "memory")]
pub use memory::MemoryBackend;
pub use query::{Order, TableQuery};
pub use store::{
    AuthProvider, Backend, CartStore, CategoryStore, ObjectStorage, ProductStore, SettingsStore,
};
