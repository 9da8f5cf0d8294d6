//! Identity resolution: who the cart belongs to.
//!
//! The current actor is the signed-in user when the backend holds a session,
//! otherwise an anonymous id generated once and kept in local storage. The
//! session itself is persisted too so a restart does not sign the admin out.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use boutique_core::ActorId;
use boutique_gateway::{Backend, Session};

use crate::error::Result;
use crate::local_storage::{LocalStorage, LocalStorageError};

/// Local storage key of the anonymous visitor id.
pub const ANONYMOUS_ID_KEY: &str = "anonymous_user_id";

/// Local storage key of the serialized auth session.
pub const SESSION_KEY: &str = "auth_session";

/// Resolves the current actor from the session and local storage.
#[derive(Clone)]
pub struct IdentityResolver {
    backend: Arc<dyn Backend>,
    storage: Arc<dyn LocalStorage>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, storage: Arc<dyn LocalStorage>) -> Self {
        Self { backend, storage }
    }

    /// The authenticated user if a session exists, otherwise the anonymous id.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Storage` if the anonymous id cannot be read or
    /// persisted.
    pub fn current_actor(&self) -> Result<ActorId> {
        if let Some(session) = self.backend.current_session() {
            return Ok(ActorId::Authenticated(session.user_id()));
        }
        Ok(ActorId::Anonymous(self.anonymous_id()?))
    }

    /// The persisted anonymous id, generated and stored on first use.
    ///
    /// A stored value that is not a UUID is replaced.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Storage` if local storage fails.
    pub fn anonymous_id(&self) -> Result<Uuid> {
        if let Some(raw) = self.storage.get(ANONYMOUS_ID_KEY)? {
            match raw.trim().parse::<Uuid>() {
                Ok(id) => return Ok(id),
                Err(e) => warn!(error = %e, "Stored anonymous id is invalid, replacing it"),
            }
        }
        let id = Uuid::new_v4();
        self.storage.set(ANONYMOUS_ID_KEY, &id.to_string())?;
        debug!(anonymous_id = %id, "Generated anonymous id");
        Ok(id)
    }

    /// Restore a persisted session into the backend client.
    ///
    /// An expired session is refreshed; if that fails (or the stored value is
    /// unreadable) it is discarded and the visitor continues anonymously.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Storage` if local storage fails.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) -> Result<Option<Session>> {
        let Some(raw) = self.storage.get(SESSION_KEY)? else {
            return Ok(None);
        };
        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Stored session is unreadable, discarding it");
                self.storage.remove(SESSION_KEY)?;
                return Ok(None);
            }
        };

        self.backend.restore_session(session.clone());
        if !session.is_expired_at(Utc::now()) {
            debug!(user_id = %session.user_id(), "Session restored");
            return Ok(Some(session));
        }

        match self.backend.refresh().await {
            Ok(refreshed) => {
                self.persist_session(&refreshed)?;
                info!(user_id = %refreshed.user_id(), "Session refreshed");
                Ok(Some(refreshed))
            }
            Err(e) => {
                warn!(error = %e, "Stored session expired and could not be refreshed");
                self.forget_session()?;
                Ok(None)
            }
        }
    }

    /// Persist `session` so it is restored on the next start.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Storage` if local storage fails.
    pub fn persist_session(&self, session: &Session) -> Result<()> {
        let encoded = serde_json::to_string(session).map_err(LocalStorageError::from)?;
        self.storage.set(SESSION_KEY, &encoded)?;
        Ok(())
    }

    /// Remove the persisted session. The anonymous id is kept.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Storage` if local storage fails.
    pub fn forget_session(&self) -> Result<()> {
        self.storage.remove(SESSION_KEY)?;
        Ok(())
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("signed_in", &self.backend.current_session().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boutique_core::UserId;
    use boutique_gateway::{AuthProvider, AuthUser, MemoryBackend};

    use super::*;
    use crate::local_storage::MemoryStorage;

    fn resolver() -> (IdentityResolver, MemoryBackend, Arc<MemoryStorage>) {
        let backend = MemoryBackend::new();
        let storage = Arc::new(MemoryStorage::new());
        let resolver = IdentityResolver::new(Arc::new(backend.clone()), storage.clone());
        (resolver, backend, storage)
    }

    fn session(expires_at: i64) -> Session {
        Session::new(
            "access",
            "refresh",
            Some(expires_at),
            AuthUser {
                id: UserId::generate(),
                email: None,
            },
        )
    }

    #[test]
    fn test_anonymous_id_is_stable() {
        let (resolver, _, storage) = resolver();
        let first = resolver.current_actor().unwrap();
        let second = resolver.current_actor().unwrap();
        assert_eq!(first, second);
        assert!(!first.is_authenticated());
        assert_eq!(
            storage.get(ANONYMOUS_ID_KEY).unwrap(),
            Some(first.partition_key())
        );
    }

    #[test]
    fn test_corrupt_anonymous_id_is_replaced() {
        let (resolver, _, storage) = resolver();
        storage.set(ANONYMOUS_ID_KEY, "not-a-uuid").unwrap();
        let id = resolver.anonymous_id().unwrap();
        assert_eq!(storage.get(ANONYMOUS_ID_KEY).unwrap(), Some(id.to_string()));
    }

    #[test]
    fn test_session_takes_precedence() {
        let (resolver, backend, _) = resolver();
        let anonymous = resolver.current_actor().unwrap();
        let session = session(Utc::now().timestamp() + 600);
        backend.restore_session(session.clone());

        let actor = resolver.current_actor().unwrap();
        assert_eq!(actor, ActorId::Authenticated(session.user_id()));
        assert_ne!(actor, anonymous);
    }

    #[tokio::test]
    async fn test_restore_live_session() {
        let (resolver, backend, _) = resolver();
        let session = session(Utc::now().timestamp() + 600);
        resolver.persist_session(&session).unwrap();

        let restored = resolver.restore_session().await.unwrap();
        assert_eq!(restored, Some(session.clone()));
        assert_eq!(backend.current_session(), Some(session));
    }

    #[tokio::test]
    async fn test_restore_expired_session_refreshes() {
        let (resolver, backend, storage) = resolver();
        let expired = session(Utc::now().timestamp() - 10);
        resolver.persist_session(&expired).unwrap();

        let restored = resolver.restore_session().await.unwrap().unwrap();
        assert_eq!(restored.user_id(), expired.user_id());
        assert_ne!(restored, expired);
        assert_eq!(backend.calls("refresh"), 1);
        let stored: Session =
            serde_json::from_str(&storage.get(SESSION_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, restored);
    }

    #[tokio::test]
    async fn test_failed_refresh_discards_session() {
        let (resolver, backend, storage) = resolver();
        resolver
            .persist_session(&session(Utc::now().timestamp() - 10))
            .unwrap();
        backend.fail_operation("refresh");

        assert_eq!(resolver.restore_session().await.unwrap(), None);
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_unreadable_session_is_discarded() {
        let (resolver, _, storage) = resolver();
        storage.set(SESSION_KEY, "garbage").unwrap();
        assert_eq!(resolver.restore_session().await.unwrap(), None);
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }
}
