//! Crate-level error type.
//!
//! Each concern has its own error enum; [`Error`] aggregates them for the
//! session facade and callers that do not care which layer failed.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::identity::StorageError;
use crate::store::CartError;

/// Any failure surfaced by a shopping session.
#[derive(Debug, Error)]
pub enum Error {
    /// Storefront API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cart mutation was refused.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Guest id storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias using the crate [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
