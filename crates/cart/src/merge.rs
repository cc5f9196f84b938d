//! Guest cart merge on sign-in.
//!
//! A merge needs both a signed-in user and a live guest id. It runs at most
//! once at a time and blocks new cart mutations. Guest mutations already in
//! flight are awaited first so they land in the guest cart before it is
//! merged. On success the guest id is retired and the user's cart reloaded. A failed
//! merge leaves both ids in place so the next transition check retries.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::api::{ApiError, CartApi};
use crate::identity::IdentityResolver;
use crate::store::{CartStore, LoadOutcome};

/// Why a merge did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nobody is signed in.
    NoUser,
    /// There is no guest cart to merge.
    NoGuest,
    /// Another merge is in flight.
    AlreadyRunning,
}

/// Result of [`MergeCoordinator::run`].
#[derive(Debug)]
pub enum MergeOutcome {
    Skipped(SkipReason),
    /// The guest cart was merged and the user's cart reloaded.
    Merged(LoadOutcome),
    /// The merge request failed; both ids were kept.
    Failed(ApiError),
}

impl MergeOutcome {
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        matches!(self, Self::Merged(_))
    }
}

/// Moves a guest cart into the signed-in user's cart.
pub struct MergeCoordinator {
    api: Arc<dyn CartApi>,
    identity: Arc<IdentityResolver>,
    store: Arc<CartStore>,
}

impl MergeCoordinator {
    #[must_use]
    pub fn new(
        api: Arc<dyn CartApi>,
        identity: Arc<IdentityResolver>,
        store: Arc<CartStore>,
    ) -> Self {
        Self {
            api,
            identity,
            store,
        }
    }

    /// Merge the guest cart if the session has both a user and a guest id.
    #[instrument(skip(self))]
    pub async fn run(&self) -> MergeOutcome {
        let state = self.identity.state();
        let Some(user) = state.user else {
            debug!("no signed-in user, skipping merge");
            return MergeOutcome::Skipped(SkipReason::NoUser);
        };
        let Some(guest_id) = state.guest_id else {
            debug!("no guest id, skipping merge");
            return MergeOutcome::Skipped(SkipReason::NoGuest);
        };
        let Some(guard) = self.store.try_begin_merge() else {
            debug!("merge already in flight");
            return MergeOutcome::Skipped(SkipReason::AlreadyRunning);
        };

        self.store.settle().await;
        info!(user_id = %user.id, guest_id = %guest_id, "merging guest cart");

        if let Err(e) = self.api.merge_guest_cart(&guest_id).await {
            warn!(error = %e, "guest cart merge failed, will retry on next sign-in check");
            return MergeOutcome::Failed(e);
        }

        self.identity.retire_guest(&guest_id).await;
        // Reload before releasing the guard so no mutation lands on the
        // pre-merge cart.
        let loaded = self.store.load(self.identity.current()).await;
        drop(guard);

        info!("guest cart merged");
        MergeOutcome::Merged(loaded)
    }
}
