//! Session identity types.

use core::fmt;

use serde::{Deserialize, Serialize};

use shopper_core::{Email, GuestId, UserId};

/// A user recognized by the backend (from `/user/decode` or sign-in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Server-issued user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    #[serde(default)]
    pub username: String,
}

/// The identity the session currently acts as.
///
/// Authenticated always takes precedence over guest; the resolver derives
/// this value from its state so the rest of the crate never inspects two
/// nullable fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Identity {
    /// The first lookup has not completed yet.
    #[default]
    Unresolved,
    /// An anonymous session identified by a locally generated token.
    Guest(GuestId),
    /// A signed-in user.
    Authenticated(AuthenticatedUser),
}

impl Identity {
    /// The cart owner that remote cart calls should be addressed to.
    ///
    /// Returns `None` while unresolved.
    #[must_use]
    pub fn owner(&self) -> Option<CartOwner> {
        match self {
            Self::Unresolved => None,
            Self::Guest(id) => Some(CartOwner::Guest(id.clone())),
            Self::Authenticated(user) => Some(CartOwner::User(user.id.clone())),
        }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Whether the identity is known (guest or authenticated).
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => f.write_str("unresolved"),
            Self::Guest(id) => write!(f, "guest:{id}"),
            Self::Authenticated(user) => write!(f, "user:{}", user.id),
        }
    }
}

/// Addressee of a remote cart call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartOwner {
    /// An authenticated user's server-side cart.
    User(UserId),
    /// A guest cart keyed by the guest token.
    Guest(GuestId),
}

impl fmt::Display for CartOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Guest(id) => write!(f, "guest:{id}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            id: UserId::parse("u-1").unwrap(),
            email: Email::parse("ada@example.com").unwrap(),
            username: "ada".to_string(),
        }
    }

    #[test]
    fn test_owner_follows_variant() {
        assert_eq!(Identity::Unresolved.owner(), None);

        let guest = GuestId::parse("g-1").unwrap();
        assert_eq!(
            Identity::Guest(guest.clone()).owner(),
            Some(CartOwner::Guest(guest))
        );

        assert_eq!(
            Identity::Authenticated(user()).owner(),
            Some(CartOwner::User(UserId::parse("u-1").unwrap()))
        );
    }

    #[test]
    fn test_decode_payload_without_username() {
        let parsed: AuthenticatedUser =
            serde_json::from_str(r#"{"id":"u-9","email":"x@y.io"}"#).unwrap();
        assert_eq!(parsed.id.as_str(), "u-9");
        assert!(parsed.username.is_empty());
    }

    #[test]
    fn test_decode_payload_with_numeric_id() {
        let parsed: AuthenticatedUser =
            serde_json::from_str(r#"{"id":5,"email":"a@b.io","username":"ada"}"#).unwrap();
        assert_eq!(parsed.id.as_str(), "5");
        assert_eq!(
            Identity::Authenticated(parsed).owner(),
            Some(CartOwner::User(UserId::parse("5").unwrap()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Identity::Authenticated(user()).to_string(), "user:u-1");
        assert_eq!(Identity::Unresolved.to_string(), "unresolved");
    }
}
