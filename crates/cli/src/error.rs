//! CLI error type.

use thiserror::Error;

use boutique_admin::AdminError;
use boutique_core::{Language, ProductId};
use boutique_storefront::ShopError;

/// Errors surfaced by a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// No password in the environment and none on stdin.
    #[error("no password given (set BOUTIQUE_ADMIN_PASSWORD or pipe it on stdin)")]
    MissingPassword,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    /// Message for the terminal. Storefront failures follow the shop
    /// language; admin screens are French only.
    #[must_use]
    pub fn user_message(&self, language: Language) -> String {
        match self {
            Self::Shop(e) => e.notice().message(language).to_string(),
            Self::Admin(e) => match e.field_errors() {
                Some(errors) => format!("{}: {errors}", e.user_message()),
                None => e.user_message().to_string(),
            },
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
