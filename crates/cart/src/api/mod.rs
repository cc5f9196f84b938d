//! Storefront API boundary.
//!
//! # Architecture
//!
//! - [`CartApi`] is the seam between the reconciliation logic and the network.
//!   The identity resolver, cart store and merge coordinator only ever talk to
//!   this trait.
//! - [`ShopperClient`] implements it over HTTP/JSON with `reqwest`; cookies
//!   are kept in the client so credentialed calls (`/user/decode`) carry the
//!   sign-in session.
//! - No call retries. Callers own failure handling.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopper_cart::api::{CartApi, ShopperClient};
//!
//! let client = ShopperClient::new(&config)?;
//! let product = client.get_product(ProductId::new(5)).await?;
//! let cart = client.get_cart(&CartOwner::Guest(guest_id)).await?;
//! ```

mod cache;
mod checkout;
mod client;
pub mod conversions;
pub mod types;

pub use client::ShopperClient;
pub use types::{RemoteCart, RemoteCartItem, RemoteInventory, RemoteProduct};

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use shopper_core::{Email, GuestId, ProductId};

use crate::models::{AuthenticatedUser, CartOwner};

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the session (401).
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend returned another non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the response body.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The payment processor did not confirm the transaction.
    #[error("Payment rejected: {0}")]
    PaymentRejected(String),

    /// An endpoint URL could not be built from the configured base URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether this is an authentication rejection rather than a transport
    /// or server failure.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Email/password pair for `POST /user/signin`.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account email.
    pub email: Email,
    /// Account password.
    pub password: SecretString,
}

/// The remote cart and user service.
///
/// Every method is a single network request with no retry.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Decode the credentialed session into a user (`GET /user/decode`).
    ///
    /// Returns [`ApiError::Unauthorized`] when the session is anonymous.
    async fn resolve_identity(&self) -> Result<AuthenticatedUser, ApiError>;

    /// Sign in with email and password (`POST /user/signin`).
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthenticatedUser, ApiError>;

    /// Fetch the server cart for `owner`.
    async fn get_cart(&self, owner: &CartOwner) -> Result<RemoteCart, ApiError>;

    /// Add `quantity` units of a product.
    async fn add_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// Delete a product's line.
    async fn remove_item(&self, owner: &CartOwner, product_id: ProductId) -> Result<(), ApiError>;

    /// Set a line's quantity.
    async fn update_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError>;

    /// Delete every line.
    async fn clear_cart(&self, owner: &CartOwner) -> Result<(), ApiError>;

    /// Merge a guest cart into the signed-in user's cart.
    async fn merge_guest_cart(&self, guest_id: &GuestId) -> Result<(), ApiError>;
}
