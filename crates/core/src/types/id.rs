//! Newtype IDs for type-safe entity references.
//!
//! Two flavours exist:
//! - [`define_id!`] wraps a numeric database key (products, orders).
//! - [`define_token!`] wraps an opaque string identifier issued by the backend
//!   or generated locally (users, guest sessions).
//!
//! Keeping them distinct types prevents passing a guest token where a user id
//! is expected when building cart requests.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use thiserror::Error;

/// Errors that can occur when parsing a string identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The input is empty or whitespace only.
    #[error("identifier cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("identifier must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or control characters.
    #[error("identifier contains an invalid character")]
    InvalidCharacter,
}

/// Maximum length of a string identifier.
pub const MAX_TOKEN_LENGTH: usize = 128;

/// Validate a string identifier.
///
/// # Errors
///
/// Returns a [`TokenError`] if the value is empty, longer than
/// [`MAX_TOKEN_LENGTH`], or contains whitespace/control characters.
pub fn validate_token(value: &str) -> Result<(), TokenError> {
    if value.trim().is_empty() {
        return Err(TokenError::Empty);
    }
    if value.len() > MAX_TOKEN_LENGTH {
        return Err(TokenError::TooLong {
            max: MAX_TOKEN_LENGTH,
        });
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(TokenError::InvalidCharacter);
    }
    Ok(())
}

/// Wire form of a string identifier.
///
/// Backends that key users by an integer column send the id as a JSON number;
/// it is kept as its decimal text.
#[doc(hidden)]
#[derive(::serde::Deserialize)]
#[serde(untagged)]
pub enum RawToken {
    Text(String),
    Number(i64),
}

impl RawToken {
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Number(value) => value.to_string(),
        }
    }
}

/// Macro to define a type-safe numeric ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `Display`, `FromStr`, `From<i32>` and `Into<i32>` implementations
///
/// # Example
///
/// ```rust
/// # use shopper_core::define_id;
/// define_id!(ProductId);
/// define_id!(OrderId);
///
/// let product_id = ProductId::new(1);
/// let order_id = OrderId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Macro to define a type-safe string identifier.
///
/// The value is validated with [`validate_token`] on construction and on
/// deserialization, so an instance is never empty. Deserialization also
/// accepts a JSON integer and keeps its decimal text.
///
/// # Example
///
/// ```rust
/// # use shopper_core::define_token;
/// define_token!(SessionToken);
///
/// assert!(SessionToken::parse("abc123").is_ok());
/// assert!(SessionToken::parse("  ").is_err());
/// ```
#[macro_export]
macro_rules! define_token {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize
        )]
        #[serde(into = "String")]
        pub struct $name(String);

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let raw = <$crate::types::id::RawToken as ::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                Self::parse(raw.into_string()).map_err(::serde::de::Error::custom)
            }
        }

        impl $name {
            /// Parse an identifier from a string.
            ///
            /// # Errors
            ///
            /// Returns a `TokenError` if the value is not a valid identifier.
            pub fn parse(value: impl Into<String>) -> Result<Self, $crate::types::id::TokenError> {
                let value = value.into();
                $crate::types::id::validate_token(&value)?;
                Ok(Self(value))
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::TokenError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::types::id::TokenError;

            fn try_from(value: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);

define_token!(UserId);
define_token!(GuestId);
define_token!(AddressId);

impl GuestId {
    /// Generate a fresh guest token.
    ///
    /// 128 cryptographically random bits, base64url-encoded without padding.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }
}
