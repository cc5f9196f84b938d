//! Session facade.
//!
//! A [`Session`] owns one identity resolver, one cart store and one merge
//! coordinator, all sharing the same [`CartApi`]. There is no global state;
//! create a session and pass it to whoever needs the cart.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::api::{CartApi, Credentials};
use crate::error::Result;
use crate::identity::{GuestIdStore, IdentityResolver};
use crate::merge::{MergeCoordinator, MergeOutcome};
use crate::models::{AuthenticatedUser, Identity};
use crate::store::CartStore;

/// One shopper's identity and cart.
pub struct Session {
    api: Arc<dyn CartApi>,
    identity: Arc<IdentityResolver>,
    cart: Arc<CartStore>,
    merge: MergeCoordinator,
}

impl Session {
    /// Create a session that has not resolved its identity yet.
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>, guests: Arc<dyn GuestIdStore>) -> Self {
        let identity = Arc::new(IdentityResolver::new(Arc::clone(&api), guests));
        let cart = Arc::new(CartStore::new(Arc::clone(&api)));
        let merge = MergeCoordinator::new(Arc::clone(&api), Arc::clone(&identity), Arc::clone(&cart));

        Self {
            api,
            identity,
            cart,
            merge,
        }
    }

    /// Resolve the identity and load its cart, merging a leftover guest cart
    /// if the session is already signed in.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Identity {
        let identity = self.identity.resolve().await;
        self.reconcile().await;
        identity
    }

    /// Sign in, then merge the guest cart and load the user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the credentials or the request
    /// fails. The identity is unchanged in that case.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<AuthenticatedUser> {
        let user = self.api.sign_in(credentials).await?;
        info!(user_id = %user.id, "signed in");

        self.identity.set_user(Some(user.clone()));
        self.reconcile().await;
        Ok(user)
    }

    /// Drop the signed-in user and load the guest cart.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Identity {
        let identity = self.identity.sign_out().await;
        self.cart.load(identity.clone()).await;
        identity
    }

    /// Run the merge check and make sure the cart matches the active
    /// identity.
    pub async fn reconcile(&self) -> MergeOutcome {
        let outcome = self.merge.run().await;
        if !outcome.is_merged() {
            self.cart.load(self.identity.current()).await;
        }
        outcome
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Shared handle to the cart store, e.g. for [`CartStore::follow`].
    #[must_use]
    pub fn cart_handle(&self) -> Arc<CartStore> {
        Arc::clone(&self.cart)
    }

    #[must_use]
    pub const fn merge(&self) -> &MergeCoordinator {
        &self.merge
    }
}
