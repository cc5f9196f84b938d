//! Shopper cart library.
//!
//! Client-side cart and session reconciliation for the Shopper storefront
//! API: guest vs. authenticated identity, merge of the guest cart on sign-in
//! and optimistic cart mutations with rollback on failure.
//!
//! # Modules
//!
//! - [`api`] - Storefront HTTP client and the [`api::CartApi`] seam
//! - [`identity`] - Identity resolver and guest id persistence
//! - [`store`] - Cart store with the optimistic mutation protocol
//! - [`merge`] - Guest cart merge coordinator
//! - [`session`] - [`Session`] facade tying the above together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod merge;
pub mod models;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::ShopperConfig;
pub use error::{Error, Result};
pub use session::Session;
