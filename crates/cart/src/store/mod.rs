//! Cart state for the active identity.
//!
//! # Architecture
//!
//! - [`CartStore`] owns the one local [`Cart`](crate::models::Cart). Every
//!   mutation is applied locally under the store lock, recorded as a
//!   [`PendingMutation`] in the in-flight table and only then sent to the
//!   remote cart.
//! - The completion handler consumes the table entry. Removes and quantity
//!   updates roll back on failure; adds and clears keep the local state and
//!   log the failure.
//! - Switching to a different cart owner bumps the identity epoch and empties
//!   the table, so completions that belong to the previous owner are dropped.

mod cart_store;
mod pending;

pub use cart_store::{CartStore, MergeGuard};
pub use pending::{MutationKind, OperationId, PendingMutation};

use rust_decimal::Decimal;
use thiserror::Error;

use shopper_core::ProductId;

use crate::api::ApiError;
use crate::models::{CartLine, Identity};

/// Reasons a cart mutation is refused before anything changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The session identity is not known yet.
    #[error("no cart identity has been resolved")]
    NoIdentity,

    /// A guest cart merge is running.
    #[error("a guest cart merge is in progress")]
    MergeInProgress,

    /// Quantity must be at least 1.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The cart has no line for this product.
    #[error("product {0} is not in the cart")]
    LineNotFound(ProductId),
}

/// How the remote side of an accepted mutation ended.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The remote cart accepted the change.
    Confirmed,
    /// The remote call failed and the local change was undone.
    RolledBack(ApiError),
    /// The remote call failed and the local change was kept.
    Unreconciled(ApiError),
    /// The identity changed before the call finished; the result was ignored.
    Stale,
}

impl SyncOutcome {
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// The remote error, if the call failed.
    #[must_use]
    pub const fn error(&self) -> Option<&ApiError> {
        match self {
            Self::RolledBack(e) | Self::Unreconciled(e) => Some(e),
            Self::Confirmed | Self::Stale => None,
        }
    }
}

/// Result of [`CartStore::load`].
#[derive(Debug)]
pub enum LoadOutcome {
    /// The local cart was replaced with the server cart.
    Loaded {
        /// Lines kept.
        lines: usize,
        /// Lines dropped as inconsistent.
        dropped: usize,
    },
    /// The fetch failed and the local cart was emptied.
    Failed(ApiError),
    /// The identity is unresolved; the local cart was emptied.
    NoIdentity,
    /// A newer load or identity change overtook this one.
    Superseded,
}

/// Read-only view of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    /// Identity the cart belongs to.
    pub identity: Identity,
    /// Lines in display order.
    pub lines: Vec<CartLine>,
    /// Total units across all lines.
    pub item_count: u64,
    /// Sum of line totals.
    pub subtotal: Decimal,
    /// Mutations awaiting a remote answer.
    pub pending: usize,
}

impl CartSnapshot {
    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }
}
