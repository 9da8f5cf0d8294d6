//! Storefront error type with Sentry reporting.
//!
//! `ShopError` separates the three failure kinds a shopper can run into:
//! a collection that could not be loaded, a mutation that was rejected, and
//! local form validation. Remote failures are captured to Sentry and logged
//! by [`ShopError::report`]; the user only ever sees [`ShopError::user_message`].

use thiserror::Error;

use boutique_core::{FieldErrors, Language};
use boutique_gateway::GatewayError;

use crate::local_storage::LocalStorageError;
use crate::notify::{Action, Notice, Notifier, Resource};

/// Storefront error.
#[derive(Debug, Error)]
pub enum ShopError {
    /// A collection fetch failed.
    #[error("Failed to load {}: {source}", .what.as_str())]
    Load {
        what: Resource,
        #[source]
        source: GatewayError,
    },

    /// A create/update/delete was rejected or could not be sent.
    #[error("Failed to {}: {source}", .action.as_str())]
    Mutation {
        action: Action,
        #[source]
        source: GatewayError,
    },

    /// Local pre-submit field checks failed.
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Client-local persisted state could not be read or written.
    #[error("Local storage error: {0}")]
    Storage(#[from] LocalStorageError),
}

impl ShopError {
    #[must_use]
    pub const fn load(what: Resource, source: GatewayError) -> Self {
        Self::Load { what, source }
    }

    #[must_use]
    pub const fn mutation(action: Action, source: GatewayError) -> Self {
        Self::Mutation { action, source }
    }

    /// The notice describing this error.
    #[must_use]
    pub const fn notice(&self) -> Notice {
        match self {
            Self::Load { what, .. } => Notice::LoadFailed(*what),
            Self::Mutation { action, .. } => Notice::ActionFailed(*action),
            Self::Validation(_) => Notice::InvalidForm,
            Self::EmptyCart => Notice::EmptyCart,
            Self::Storage(_) => Notice::StorageUnavailable,
        }
    }

    /// Message safe to show to the user, in the shop's default language.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        self.notice().message(Language::French)
    }

    /// Field errors, for inline display next to form inputs.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// The underlying gateway error, if this came from the backend.
    #[must_use]
    pub const fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Load { source, .. } | Self::Mutation { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Report the error and send its notice to `notifier`, then return it.
    #[must_use]
    pub fn surface(self, notifier: &dyn Notifier) -> Self {
        self.report();
        notifier.notify(self.notice());
        self
    }

    /// Log the error and capture remote failures to Sentry.
    pub fn report(&self) {
        match self {
            Self::Load { .. } | Self::Mutation { .. } | Self::Storage(_) => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Storefront operation failed"
                );
            }
            Self::Validation(errors) => {
                tracing::debug!(%errors, "Form rejected");
            }
            Self::EmptyCart => {
                tracing::debug!("Checkout of an empty cart");
            }
        }
    }
}

/// Result type alias for `ShopError`.
pub type Result<T> = std::result::Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_details() {
        let err = ShopError::load(
            Resource::Products,
            GatewayError::Api {
                status: 500,
                code: "XX000".to_string(),
                message: "relation does not exist".to_string(),
            },
        );
        assert_eq!(err.user_message(), "Erreur de chargement des produits");
        assert!(err.to_string().contains("relation does not exist"));
    }

    #[test]
    fn test_validation_exposes_fields() {
        let mut errors = FieldErrors::new();
        errors.push("name", "Le nom est requis");
        let err = ShopError::from(errors);
        assert_eq!(
            err.field_errors().and_then(|e| e.get("name")),
            Some("Le nom est requis")
        );
        assert_eq!(err.notice(), Notice::InvalidForm);
        assert!(err.gateway_error().is_none());
    }
}
