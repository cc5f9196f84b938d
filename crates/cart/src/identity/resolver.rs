//! Session identity resolution.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use shopper_core::GuestId;

use crate::api::CartApi;
use crate::models::{AuthenticatedUser, Identity};

use super::guest::GuestIdStore;

/// Everything the resolver knows about the session.
///
/// The guest id survives sign-in until a merge retires it; [`Self::active`]
/// applies the precedence rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityState {
    /// Signed-in user, if any.
    pub user: Option<AuthenticatedUser>,
    /// Guest token, if one is live.
    pub guest_id: Option<GuestId>,
    /// Whether the first resolution has completed.
    pub resolved: bool,
}

impl IdentityState {
    /// The identity cart operations act as.
    #[must_use]
    pub fn active(&self) -> Identity {
        if !self.resolved {
            return Identity::Unresolved;
        }
        match (&self.user, &self.guest_id) {
            (Some(user), _) => Identity::Authenticated(user.clone()),
            (None, Some(guest_id)) => Identity::Guest(guest_id.clone()),
            (None, None) => Identity::Unresolved,
        }
    }
}

/// Decides whether the session is a guest or a signed-in user.
///
/// Subscribers are notified only when [`IdentityState::active`] changes.
pub struct IdentityResolver {
    api: Arc<dyn CartApi>,
    guests: Arc<dyn GuestIdStore>,
    state: watch::Sender<IdentityState>,
}

impl IdentityResolver {
    /// Create an unresolved resolver.
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>, guests: Arc<dyn GuestIdStore>) -> Self {
        Self {
            api,
            guests,
            state: watch::Sender::new(IdentityState::default()),
        }
    }

    /// Look up the server session and the stored guest id concurrently.
    ///
    /// Never fails: an anonymous or unreachable session resolves to the guest
    /// identity, and an unusable guest store yields an in-memory guest id.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Identity {
        let (user, guest_id) = tokio::join!(self.lookup_user(), self.load_or_create_guest());

        self.update(|state| {
            state.user = user;
            state.guest_id = Some(guest_id);
            state.resolved = true;
        });

        let identity = self.current();
        info!(identity = %identity, "session identity resolved");
        identity
    }

    async fn lookup_user(&self) -> Option<AuthenticatedUser> {
        match self.api.resolve_identity().await {
            Ok(user) => Some(user),
            Err(e) if e.is_unauthorized() => {
                debug!("no authenticated session");
                None
            }
            Err(e) => {
                warn!(error = %e, "identity lookup failed, continuing as guest");
                None
            }
        }
    }

    async fn load_or_create_guest(&self) -> GuestId {
        match self.guests.load().await {
            Ok(Some(guest_id)) => return guest_id,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "guest id store unreadable, issuing a new guest id"),
        }
        self.issue_guest().await
    }

    /// Generate and persist a fresh guest id, keeping it in memory if the
    /// store refuses it.
    async fn issue_guest(&self) -> GuestId {
        let guest_id = GuestId::generate();
        if let Err(e) = self.guests.save(&guest_id).await {
            warn!(error = %e, "failed to persist guest id, keeping it in memory");
        }
        guest_id
    }

    /// Apply `change`, notifying subscribers if the active identity moved.
    fn update(&self, change: impl FnOnce(&mut IdentityState)) {
        self.state.send_if_modified(|state| {
            let before = state.active();
            change(state);
            state.active() != before
        });
    }

    /// The identity cart operations currently act as.
    #[must_use]
    pub fn current(&self) -> Identity {
        self.state.borrow().active()
    }

    /// A copy of the full resolver state.
    #[must_use]
    pub fn state(&self) -> IdentityState {
        self.state.borrow().clone()
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<AuthenticatedUser> {
        self.state.borrow().user.clone()
    }

    /// The live guest id, if any.
    #[must_use]
    pub fn guest_id(&self) -> Option<GuestId> {
        self.state.borrow().guest_id.clone()
    }

    /// Receive a notification whenever the active identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.state.subscribe()
    }

    /// Record a successful sign-in, or drop the user with `None`.
    pub fn set_user(&self, user: Option<AuthenticatedUser>) {
        self.update(|state| {
            state.user = user;
            state.resolved = true;
        });
    }

    /// Drop the signed-in user and fall back to a guest identity.
    ///
    /// A new guest id is issued when the previous one was merged away.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Identity {
        let guest_id = match self.guest_id() {
            Some(guest_id) => guest_id,
            None => self.issue_guest().await,
        };

        self.update(|state| {
            state.user = None;
            state.guest_id = Some(guest_id);
            state.resolved = true;
        });

        let identity = self.current();
        info!(identity = %identity, "signed out");
        identity
    }

    /// Clear the guest id after its cart was merged.
    ///
    /// Does nothing unless `guest_id` is still the live guest id. Returns
    /// whether the id was retired. A store failure is logged; the in-memory
    /// id is cleared regardless.
    #[instrument(skip(self), fields(guest_id = %guest_id))]
    pub async fn retire_guest(&self, guest_id: &GuestId) -> bool {
        let mut retired = false;
        self.update(|state| {
            if state.guest_id.as_ref() == Some(guest_id) {
                state.guest_id = None;
                retired = true;
            }
        });

        if !retired {
            debug!("guest id already replaced, nothing to retire");
            return false;
        }

        if let Err(e) = self.guests.clear().await {
            warn!(error = %e, "failed to remove persisted guest id");
        }
        true
    }
}
