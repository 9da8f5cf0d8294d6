//! Actor identity: who the current cart belongs to.

use core::fmt;

use uuid::Uuid;

use crate::types::id::UserId;

/// The identity that scopes cart rows.
///
/// Either a server-issued user id (signed-in admin or customer) or a random
/// anonymous id persisted on the client. Exactly one is active at a time.
/// Both display as the bare UUID string stored in `cart_items.user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorId {
    /// An authenticated user with a live session.
    Authenticated(UserId),
    /// A visitor without a session.
    Anonymous(Uuid),
}

impl ActorId {
    /// The value written to and filtered on in the cart table.
    #[must_use]
    pub fn partition_key(&self) -> String {
        self.to_string()
    }

    /// Whether this actor comes from an authenticated session.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated(id) => write!(f, "{id}"),
            Self::Anonymous(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_key_is_bare_uuid() {
        let raw = Uuid::new_v4();
        assert_eq!(ActorId::Anonymous(raw).partition_key(), raw.to_string());
        assert_eq!(
            ActorId::Authenticated(UserId::new(raw)).partition_key(),
            raw.to_string()
        );
    }

    #[test]
    fn test_is_authenticated() {
        assert!(ActorId::Authenticated(UserId::generate()).is_authenticated());
        assert!(!ActorId::Anonymous(Uuid::new_v4()).is_authenticated());
    }
}
