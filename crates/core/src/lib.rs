//! Shopper Core - value types shared by the cart client and the CLI.
//!
//! Identifiers ([`ProductId`], [`UserId`], [`GuestId`]), [`Email`] and
//! [`Price`]. Nothing here performs I/O or needs an async runtime; guest id
//! generation only needs a random source.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
