//! In-flight optimistic mutations.

use core::fmt;

use shopper_core::ProductId;

use crate::models::CartLine;

/// Identifies one optimistic mutation from local apply to remote completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Kind of cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Add,
    Remove,
    UpdateQuantity,
    Clear,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::UpdateQuantity => "update_quantity",
            Self::Clear => "clear",
        })
    }
}

/// An optimistic change already applied locally, with what rollback needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingMutation {
    /// Units added to a line. Never rolled back.
    Add { product_id: ProductId, quantity: u32 },
    /// A removed line and where it sat.
    Remove { position: usize, line: CartLine },
    /// A quantity change from `previous` to `applied`.
    UpdateQuantity {
        product_id: ProductId,
        previous: u32,
        applied: u32,
    },
    /// The cart was emptied. Never rolled back.
    Clear,
}

impl PendingMutation {
    #[must_use]
    pub const fn kind(&self) -> MutationKind {
        match self {
            Self::Add { .. } => MutationKind::Add,
            Self::Remove { .. } => MutationKind::Remove,
            Self::UpdateQuantity { .. } => MutationKind::UpdateQuantity,
            Self::Clear => MutationKind::Clear,
        }
    }

    /// Whether a remote failure should undo the local change.
    #[must_use]
    pub const fn rolls_back(&self) -> bool {
        matches!(self, Self::Remove { .. } | Self::UpdateQuantity { .. })
    }
}

/// Entry in the in-flight table.
#[derive(Debug, Clone)]
pub(crate) struct InFlight {
    /// Identity epoch the mutation was applied under.
    pub epoch: u64,
    pub mutation: PendingMutation,
}
