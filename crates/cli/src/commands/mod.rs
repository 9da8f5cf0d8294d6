//! Command handlers.

pub mod admin;
pub mod cart;
pub mod catalog;
