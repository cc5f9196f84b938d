//! Guest/authenticated identity for a shopping session.
//!
//! [`IdentityResolver`] owns the session's identity state. It is the only
//! writer of the persisted guest id, which it reaches through a
//! [`GuestIdStore`].

mod guest;
mod resolver;

pub use guest::{FileGuestStore, GuestIdStore, MemoryGuestStore, StorageError};
pub use resolver::{IdentityResolver, IdentityState};
