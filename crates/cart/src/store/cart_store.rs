use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use shopper_core::ProductId;

use crate::api::conversions::convert_cart;
use crate::api::{ApiError, CartApi};
use crate::identity::IdentityState;
use crate::models::{Cart, CartOwner, Identity, Product};

use super::pending::{InFlight, OperationId, PendingMutation};
use super::{CartError, CartSnapshot, LoadOutcome, SyncOutcome};

#[derive(Debug, Default)]
struct StoreState {
    identity: Identity,
    /// Bumped whenever the cart owner changes.
    epoch: u64,
    /// Ticket of the most recently started load.
    loads_started: u64,
    cart: Cart,
    in_flight: HashMap<OperationId, InFlight>,
    merging: bool,
}

impl StoreState {
    /// Adopt `identity`, discarding the cart if the owner changes.
    fn switch_identity(&mut self, identity: Identity) {
        if identity.owner() != self.identity.owner() {
            self.epoch += 1;
            self.cart.clear();
            if !self.in_flight.is_empty() {
                debug!(
                    dropped = self.in_flight.len(),
                    "identity changed, abandoning in-flight mutations"
                );
                self.in_flight.clear();
            }
        }
        self.identity = identity;
    }

    /// Owner for a new mutation, or why none may start.
    fn mutable_owner(&self) -> Result<CartOwner, CartError> {
        if self.merging {
            return Err(CartError::MergeInProgress);
        }
        self.identity.owner().ok_or(CartError::NoIdentity)
    }

    /// Undo a failed mutation where that is still safe.
    fn rollback(&mut self, mutation: PendingMutation, error: ApiError) -> SyncOutcome {
        if !mutation.rolls_back() {
            warn!(kind = %mutation.kind(), error = %error, "remote mutation failed, keeping local change");
            return SyncOutcome::Unreconciled(error);
        }

        match mutation {
            PendingMutation::Add { .. } | PendingMutation::Clear => SyncOutcome::Unreconciled(error),
            PendingMutation::Remove { position, line } => {
                let product_id = line.product_id;
                if self.cart.restore(position, line) {
                    warn!(product_id = %product_id, error = %error, "remote remove failed, line restored");
                    SyncOutcome::RolledBack(error)
                } else {
                    debug!(product_id = %product_id, "product re-added since remove, not restoring");
                    SyncOutcome::Unreconciled(error)
                }
            }
            PendingMutation::UpdateQuantity {
                product_id,
                previous,
                applied,
            } => {
                let current = self.cart.line(product_id).map(|l| l.quantity);
                if current == Some(applied) {
                    self.cart.set_quantity(product_id, previous);
                    warn!(product_id = %product_id, error = %error, previous, "remote update failed, quantity restored");
                    SyncOutcome::RolledBack(error)
                } else {
                    debug!(product_id = %product_id, "line changed since update, not restoring");
                    SyncOutcome::Unreconciled(error)
                }
            }
        }
    }
}

/// Holds the cart for the active identity and reconciles it with the server.
pub struct CartStore {
    api: Arc<dyn CartApi>,
    state: Mutex<StoreState>,
    next_operation: AtomicU64,
    /// Signalled whenever an in-flight entry goes away.
    drained: Notify,
}

/// An in-flight entry owned by a running mutation.
///
/// Dropping it uncompleted (the mutation future was cancelled) abandons the
/// entry so the table still drains.
struct Registration<'a> {
    store: &'a CartStore,
    id: OperationId,
    completed: bool,
}

impl Registration<'_> {
    fn complete(mut self, result: Result<(), ApiError>) -> SyncOutcome {
        self.completed = true;
        self.store.complete(self.id, result)
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let abandoned = self.store.lock().in_flight.remove(&self.id).is_some();
        if abandoned {
            debug!(operation = %self.id, "mutation cancelled before completion");
        }
        self.store.drained.notify_waiters();
    }
}

/// Blocks cart mutations while alive. See [`CartStore::try_begin_merge`].
#[must_use = "mutations are only blocked while the guard is held"]
pub struct MergeGuard<'a> {
    store: &'a CartStore,
}

impl Drop for MergeGuard<'_> {
    fn drop(&mut self) {
        self.store.lock().merging = false;
    }
}

impl CartStore {
    /// Create an empty store with no identity.
    #[must_use]
    pub fn new(api: Arc<dyn CartApi>) -> Self {
        Self {
            api,
            state: Mutex::new(StoreState::default()),
            next_operation: AtomicU64::new(1),
            drained: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a mutation that was just applied locally.
    fn register(&self, state: &mut StoreState, mutation: PendingMutation) -> Registration<'_> {
        let id = OperationId::new(self.next_operation.fetch_add(1, Ordering::Relaxed));
        debug!(operation = %id, kind = %mutation.kind(), "mutation applied locally");
        state.in_flight.insert(
            id,
            InFlight {
                epoch: state.epoch,
                mutation,
            },
        );
        Registration {
            store: self,
            id,
            completed: false,
        }
    }

    /// Consume the in-flight entry for `id` and reconcile with `result`.
    fn complete(&self, id: OperationId, result: Result<(), ApiError>) -> SyncOutcome {
        let outcome = {
            let mut state = self.lock();
            match state.in_flight.remove(&id) {
                Some(in_flight) if in_flight.epoch == state.epoch => match result {
                    Ok(()) => SyncOutcome::Confirmed,
                    Err(e) => state.rollback(in_flight.mutation, e),
                },
                _ => {
                    debug!(operation = %id, "dropping completion for a previous identity");
                    SyncOutcome::Stale
                }
            }
        };
        self.drained.notify_waiters();
        outcome
    }

    /// Replace the local cart with the server cart for `identity`.
    ///
    /// Lines whose product no longer exists server-side are dropped. On
    /// failure the cart is left empty. A load is discarded if the identity
    /// changed or another load started while it was in flight.
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn load(&self, identity: Identity) -> LoadOutcome {
        let Some(owner) = identity.owner() else {
            self.lock().switch_identity(identity);
            self.drained.notify_waiters();
            return LoadOutcome::NoIdentity;
        };

        let (epoch, ticket) = {
            let mut state = self.lock();
            state.switch_identity(identity);
            state.loads_started += 1;
            (state.epoch, state.loads_started)
        };
        self.drained.notify_waiters();

        let result = self.api.get_cart(&owner).await;

        let mut state = self.lock();
        if state.epoch != epoch || state.loads_started != ticket {
            debug!("discarding superseded cart load");
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(remote) => {
                let (cart, dropped) = convert_cart(remote);
                if dropped > 0 {
                    debug!(dropped, "dropped inconsistent server cart lines");
                }
                let lines = cart.len();
                state.cart = cart;
                info!(lines, "cart loaded");
                LoadOutcome::Loaded { lines, dropped }
            }
            Err(e) => {
                warn!(error = %e, "failed to load cart, starting empty");
                state.cart = Cart::default();
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Add `quantity` units of `product`.
    ///
    /// The local quantity is not clamped to stock and a remote failure is
    /// logged without rollback.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if `quantity` is zero or no mutation may run.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_item(&self, product: &Product, quantity: u32) -> Result<SyncOutcome, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let (owner, registration) = {
            let mut state = self.lock();
            let owner = state.mutable_owner()?;
            state.cart.add(product, quantity);
            let registration = self.register(
                &mut state,
                PendingMutation::Add {
                    product_id: product.id,
                    quantity,
                },
            );
            (owner, registration)
        };

        let result = self.api.add_item(&owner, product.id, quantity).await;
        Ok(registration.complete(result))
    }

    /// Remove the line for `product_id`, restoring it if the remote delete
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the product has no line or no mutation may run.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: ProductId) -> Result<SyncOutcome, CartError> {
        let (owner, registration) = {
            let mut state = self.lock();
            let owner = state.mutable_owner()?;
            let (position, line) = state
                .cart
                .remove(product_id)
                .ok_or(CartError::LineNotFound(product_id))?;
            let registration =
                self.register(&mut state, PendingMutation::Remove { position, line });
            (owner, registration)
        };

        let result = self.api.remove_item(&owner, product_id).await;
        Ok(registration.complete(result))
    }

    /// Set a line's quantity, clamped to `[1, max_quantity]`.
    ///
    /// The clamped value is what the server receives. A remote failure
    /// restores the previous quantity unless the line changed again since.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the product has no line or no mutation may run.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<SyncOutcome, CartError> {
        let (owner, registration, applied) = {
            let mut state = self.lock();
            let owner = state.mutable_owner()?;
            let applied = state
                .cart
                .line(product_id)
                .map(|l| l.clamp_quantity(quantity))
                .ok_or(CartError::LineNotFound(product_id))?;
            let previous = state
                .cart
                .set_quantity(product_id, applied)
                .ok_or(CartError::LineNotFound(product_id))?;
            let registration = self.register(
                &mut state,
                PendingMutation::UpdateQuantity {
                    product_id,
                    previous,
                    applied,
                },
            );
            (owner, registration, applied)
        };

        let result = self.api.update_item(&owner, product_id, applied).await;
        Ok(registration.complete(result))
    }

    /// Empty the cart. A remote failure is logged without rollback.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if no mutation may run.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<SyncOutcome, CartError> {
        let (owner, registration) = {
            let mut state = self.lock();
            let owner = state.mutable_owner()?;
            state.cart.clear();
            let registration = self.register(&mut state, PendingMutation::Clear);
            (owner, registration)
        };

        let result = self.api.clear_cart(&owner).await;
        Ok(registration.complete(result))
    }

    /// Current identity, lines and totals.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        let state = self.lock();
        CartSnapshot {
            identity: state.identity.clone(),
            lines: state.cart.lines().to_vec(),
            item_count: state.cart.item_count(),
            subtotal: state.cart.subtotal(),
            pending: state.in_flight.len(),
        }
    }

    /// Identity the cart currently belongs to.
    #[must_use]
    pub fn identity(&self) -> Identity {
        self.lock().identity.clone()
    }

    /// Whether a merge currently blocks mutations.
    #[must_use]
    pub fn is_merging(&self) -> bool {
        self.lock().merging
    }

    /// Wait until every in-flight mutation has completed or been abandoned.
    ///
    /// Combined with [`Self::try_begin_merge`] this leaves the table empty,
    /// since no new mutation can start while the guard is held.
    pub async fn settle(&self) {
        loop {
            let notified = self.drained.notified();
            let mut notified = std::pin::pin!(notified);
            notified.as_mut().enable();

            let pending = self.lock().in_flight.len();
            if pending == 0 {
                return;
            }
            debug!(pending, "waiting for in-flight mutations");
            notified.await;
        }
    }

    /// Block mutations for the duration of a merge.
    ///
    /// Mutations already in flight keep running; call [`Self::settle`] to
    /// wait for them. Returns `None` if a merge is already running.
    pub fn try_begin_merge(&self) -> Option<MergeGuard<'_>> {
        let mut state = self.lock();
        if state.merging {
            return None;
        }
        state.merging = true;
        Some(MergeGuard { store: self })
    }

    /// Load the current identity now and reload on every identity change.
    ///
    /// The task ends when the resolver is dropped.
    pub fn follow(self: &Arc<Self>, mut identities: watch::Receiver<IdentityState>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let identity = identities.borrow_and_update().active();
                store.load(identity).await;
                if identities.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
