//! Unified error handling for admin.

use thiserror::Error;

use boutique_core::{FieldErrors, Language, UserId};
use boutique_gateway::GatewayError;
use boutique_storefront::ShopError;
use boutique_storefront::notify::Notice;

/// Back-office error type.
#[derive(Debug, Error)]
pub enum AdminError {
    /// No admin session; the caller must sign in first.
    #[error("Unauthorized: sign in required")]
    Unauthorized,

    /// Email/password rejected by the auth service.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Form checks failed before anything was sent.
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// A storefront accessor failed (already reported and notified).
    #[error(transparent)]
    Shop(#[from] ShopError),

    /// A direct backend call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl AdminError {
    /// Message safe to show on the admin screens.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Veuillez vous connecter pour continuer.",
            Self::InvalidCredentials => "Identifiants invalides. Veuillez réessayer.",
            Self::Validation(_) => Notice::InvalidForm.message(Language::French),
            Self::Shop(e) => e.user_message(),
            Self::Gateway(_) => "Une erreur est survenue. Veuillez réessayer.",
        }
    }

    /// Field errors, for inline display next to form inputs.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            Self::Shop(e) => e.field_errors(),
            _ => None,
        }
    }

    /// Capture backend failures to Sentry and log them.
    ///
    /// `Shop` errors are reported where they occur and are skipped here.
    pub fn report(&self) {
        match self {
            Self::Gateway(_) => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Admin operation failed"
                );
            }
            Self::Unauthorized | Self::InvalidCredentials => {
                tracing::warn!(error = %self, "Admin access refused");
            }
            Self::Validation(errors) => tracing::debug!(%errors, "Admin form rejected"),
            Self::Shop(_) => {}
        }
    }
}

/// Set the Sentry user context for the signed-in admin.
pub fn set_sentry_user(user_id: UserId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
