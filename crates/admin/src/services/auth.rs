//! Admin authentication service.
//!
//! Email/password sign-in against the hosted auth service. The session is
//! persisted in local storage so the admin stays signed in across restarts.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use boutique_core::{Email, EmailError, FieldErrors};
use boutique_gateway::{GatewayError, Session};
use boutique_storefront::AppState;

use crate::error::{AdminError, clear_sentry_user, set_sentry_user};

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    state: &'a AppState,
}

impl<'a> AdminAuthService<'a> {
    #[must_use]
    pub const fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Sign in and persist the session.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Validation` for a malformed email or blank
    /// password, `AdminError::InvalidCredentials` when the pair is rejected,
    /// or `AdminError::Gateway` if the auth service cannot be reached.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, AdminError> {
        let email = check_credentials(email, password)?;

        let session = self
            .state
            .backend()
            .sign_in(&email, password)
            .await
            .map_err(|e| {
                let err = match e {
                    GatewayError::InvalidCredentials => AdminError::InvalidCredentials,
                    other => AdminError::Gateway(other),
                };
                err.report();
                err
            })?;

        self.state.identity().persist_session(&session)?;
        set_sentry_user(session.user_id(), session.user.email.as_deref());
        info!(user_id = %session.user_id(), "Admin signed in");
        Ok(session)
    }

    /// Sign out and forget the persisted session.
    ///
    /// The local session is gone even when the server call fails.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Gateway` if the server rejects the logout.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AdminError> {
        let remote = self.state.backend().sign_out().await;
        self.state.identity().forget_session()?;
        clear_sentry_user();

        remote.map_err(|e| {
            let err = AdminError::Gateway(e);
            err.report();
            err
        })?;
        info!("Admin signed out");
        Ok(())
    }

    /// The current admin session, refreshing it if it has expired.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` when there is no usable session.
    pub async fn require_session(&self) -> Result<Session, AdminError> {
        let session = self
            .state
            .backend()
            .current_session()
            .ok_or(AdminError::Unauthorized)?;
        if !session.is_expired_at(Utc::now()) {
            return Ok(session);
        }

        match self.state.backend().refresh().await {
            Ok(refreshed) => {
                self.state.identity().persist_session(&refreshed)?;
                Ok(refreshed)
            }
            Err(e) => {
                warn!(error = %e, "Admin session expired");
                self.state.identity().forget_session()?;
                Err(AdminError::Unauthorized)
            }
        }
    }
}

fn check_credentials(email: &str, password: &SecretString) -> Result<Email, FieldErrors> {
    let mut errors = FieldErrors::new();
    let parsed = Email::parse(email);
    match &parsed {
        Ok(_) => {}
        Err(EmailError::Empty) => errors.push("email", "L'email est requis"),
        Err(_) => errors.push("email", "Adresse email invalide"),
    }
    if password.expose_secret().is_empty() {
        errors.push("password", "Le mot de passe est requis");
    }
    match parsed {
        Ok(email) if errors.is_empty() => Ok(email),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use boutique_gateway::{AuthProvider, MemoryBackend};
    use boutique_storefront::identity::SESSION_KEY;
    use boutique_storefront::local_storage::{LocalStorage, MemoryStorage};
    use boutique_storefront::notify::TracingNotifier;

    use super::*;

    fn state() -> (AppState, MemoryBackend, Arc<MemoryStorage>) {
        let backend = MemoryBackend::new();
        backend.seed_user("admin@techgadget.cm", "s3cret-pass");
        let storage = Arc::new(MemoryStorage::new());
        let state = AppState::new(
            Arc::new(backend.clone()),
            storage.clone(),
            Arc::new(TracingNotifier::default()),
            "+237695959595",
        );
        (state, backend, storage)
    }

    fn password(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn test_sign_in_persists_session() {
        let (state, backend, storage) = state();
        let auth = AdminAuthService::new(&state);

        let session = auth
            .sign_in(" admin@techgadget.cm ", &password("s3cret-pass"))
            .await
            .unwrap();

        assert_eq!(backend.current_session(), Some(session));
        assert!(storage.get(SESSION_KEY).unwrap().is_some());
        assert!(auth.require_session().await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (state, _, storage) = state();
        let err = AdminAuthService::new(&state)
            .sign_in("admin@techgadget.cm", &password("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidCredentials));
        assert!(storage.get(SESSION_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_form_checked_before_sending() {
        let (state, backend, _) = state();
        let err = AdminAuthService::new(&state)
            .sign_in("admin", &password(""))
            .await
            .unwrap_err();

        let errors = err.field_errors().unwrap();
        assert_eq!(errors.get("email"), Some("Adresse email invalide"));
        assert_eq!(errors.get("password"), Some("Le mot de passe est requis"));
        assert_eq!(backend.calls("sign_in"), 0);
    }

    #[tokio::test]
    async fn test_sign_out_forgets_session() {
        let (state, backend, storage) = state();
        let auth = AdminAuthService::new(&state);
        auth.sign_in("admin@techgadget.cm", &password("s3cret-pass"))
            .await
            .unwrap();

        auth.sign_out().await.unwrap();

        assert!(backend.current_session().is_none());
        assert!(storage.get(SESSION_KEY).unwrap().is_none());
        assert!(matches!(
            auth.require_session().await,
            Err(AdminError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_failed_sign_out_still_clears_locally() {
        let (state, backend, storage) = state();
        let auth = AdminAuthService::new(&state);
        auth.sign_in("admin@techgadget.cm", &password("s3cret-pass"))
            .await
            .unwrap();
        backend.fail_operation("sign_out");

        assert!(matches!(auth.sign_out().await, Err(AdminError::Gateway(_))));
        assert!(backend.current_session().is_none());
        assert!(storage.get(SESSION_KEY).unwrap().is_none());
    }
}
