//! In-memory [`CartApi`] for unit tests.
//!
//! Mirrors the backend's cart semantics closely enough for the store and
//! merge logic: per-owner carts, a product catalog joined on read, a session
//! user standing in for the auth cookie and a merge that sums guest lines
//! into the user's cart. Calls can be made to fail or paused mid-flight.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use tokio::sync::Notify;

use shopper_core::{Email, GuestId, ProductId, UserId};

use crate::api::{
    ApiError, CartApi, Credentials, RemoteCart, RemoteCartItem, RemoteInventory, RemoteProduct,
};
use crate::models::{AuthenticatedUser, CartOwner, Product};

/// A user with id `id` and a matching email.
pub fn user(id: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        id: UserId::parse(id).unwrap(),
        email: Email::parse(&format!("{id}@example.com")).unwrap(),
        username: id.to_string(),
    }
}

/// A product priced at 10.00 with `max` units in stock.
pub fn product(id: i32, max: u32) -> Product {
    Product::new(ProductId::new(id), format!("Product {id}"), Decimal::new(1000, 2), max)
}

/// Remote calls that can be failed or paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    ResolveIdentity,
    SignIn,
    GetCart,
    AddItem,
    RemoveItem,
    UpdateItem,
    ClearCart,
    MergeGuestCart,
}

/// Holds one paused call until released.
#[derive(Default)]
pub struct Gate {
    arrived: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until a call reaches the gate.
    pub async fn arrived(&self) {
        self.arrived.notified().await;
    }

    /// Let the paused call continue.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct FakeState {
    session: Option<AuthenticatedUser>,
    accounts: HashMap<String, (String, AuthenticatedUser)>,
    carts: HashMap<CartOwner, Vec<(ProductId, i64)>>,
    catalog: HashMap<ProductId, RemoteProduct>,
    failing: HashSet<Call>,
    calls: Vec<Call>,
    last_update: Option<(ProductId, u32)>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
    gates: Mutex<HashMap<Call, Arc<Gate>>>,
}

fn injected() -> ApiError {
    ApiError::Api {
        status: 500,
        message: "injected failure".to_string(),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the user the backend session decodes to.
    pub fn set_session(&self, user: Option<AuthenticatedUser>) {
        self.state().session = user;
    }

    /// Register an account that `sign_in` accepts.
    pub fn add_account(&self, user: AuthenticatedUser, password: &str) {
        self.state().accounts.insert(
            user.email.as_str().to_string(),
            (password.to_string(), user),
        );
    }

    /// Make every later `call` fail with a 500.
    pub fn fail(&self, call: Call) {
        self.state().failing.insert(call);
    }

    /// Undo [`Self::fail`].
    pub fn recover(&self, call: Call) {
        self.state().failing.remove(&call);
    }

    /// Pause the next `call` until the returned gate is released.
    pub fn pause(&self, call: Call) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(call, gate.clone());
        gate
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn calls_to(&self, call: Call) -> usize {
        self.state().calls.iter().filter(|c| **c == call).count()
    }

    /// Product and quantity of the last `update_item` call.
    pub fn last_update(&self) -> Option<(ProductId, u32)> {
        self.state().last_update
    }

    /// Replace `owner`'s server cart.
    pub fn seed_cart(&self, owner: &CartOwner, items: &[(i32, i64)]) {
        let mut state = self.state();
        let items = items
            .iter()
            .map(|&(id, quantity)| {
                let product_id = ProductId::new(id);
                ensure_product(&mut state.catalog, product_id);
                (product_id, quantity)
            })
            .collect();
        state.carts.insert(owner.clone(), items);
    }

    /// Delete a product from the catalog; cart lines keep referencing it.
    pub fn forget_product(&self, product_id: ProductId) {
        self.state().catalog.remove(&product_id);
    }

    /// `owner`'s server cart as `(product, quantity)` pairs.
    pub fn server_cart(&self, owner: &CartOwner) -> Vec<(ProductId, i64)> {
        self.state().carts.get(owner).cloned().unwrap_or_default()
    }

    /// Record the call, wait at its gate if paused, then apply failure
    /// injection.
    async fn enter(&self, call: Call) -> Result<(), ApiError> {
        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&call);
        if let Some(gate) = gate {
            gate.arrived.notify_one();
            gate.release.notified().await;
        }

        let mut state = self.state();
        state.calls.push(call);
        if state.failing.contains(&call) {
            return Err(injected());
        }
        Ok(())
    }
}

fn ensure_product(catalog: &mut HashMap<ProductId, RemoteProduct>, product_id: ProductId) {
    catalog.entry(product_id).or_insert_with(|| RemoteProduct {
        name: format!("Product {product_id}"),
        price: Decimal::new(1000, 2),
        image_url: None,
        inventory: Some(RemoteInventory {
            quantity_available: 10,
        }),
    });
}

#[async_trait]
impl CartApi for FakeApi {
    async fn resolve_identity(&self) -> Result<AuthenticatedUser, ApiError> {
        self.enter(Call::ResolveIdentity).await?;
        self.state().session.clone().ok_or(ApiError::Unauthorized)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthenticatedUser, ApiError> {
        self.enter(Call::SignIn).await?;
        let mut state = self.state();
        let user = match state.accounts.get(credentials.email.as_str()) {
            Some((password, user)) if password == credentials.password.expose_secret() => {
                user.clone()
            }
            _ => {
                return Err(ApiError::Api {
                    status: 400,
                    message: "Invalid credentials".to_string(),
                });
            }
        };
        state.session = Some(user.clone());
        Ok(user)
    }

    async fn get_cart(&self, owner: &CartOwner) -> Result<RemoteCart, ApiError> {
        self.enter(Call::GetCart).await?;
        let state = self.state();
        let cart_items = state
            .carts
            .get(owner)
            .map(|items| {
                items
                    .iter()
                    .map(|&(product_id, quantity)| RemoteCartItem {
                        product_id,
                        quantity,
                        product: state.catalog.get(&product_id).cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(RemoteCart { cart_items })
    }

    async fn add_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.enter(Call::AddItem).await?;
        let mut state = self.state();
        ensure_product(&mut state.catalog, product_id);
        let items = state.carts.entry(owner.clone()).or_default();
        match items.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, existing)) => *existing += i64::from(quantity),
            None => items.push((product_id, i64::from(quantity))),
        }
        Ok(())
    }

    async fn remove_item(&self, owner: &CartOwner, product_id: ProductId) -> Result<(), ApiError> {
        self.enter(Call::RemoveItem).await?;
        if let Some(items) = self.state().carts.get_mut(owner) {
            items.retain(|(id, _)| *id != product_id);
        }
        Ok(())
    }

    async fn update_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.enter(Call::UpdateItem).await?;
        let mut state = self.state();
        state.last_update = Some((product_id, quantity));
        if let Some(items) = state.carts.get_mut(owner)
            && let Some((_, existing)) = items.iter_mut().find(|(id, _)| *id == product_id)
        {
            *existing = i64::from(quantity);
        }
        Ok(())
    }

    async fn clear_cart(&self, owner: &CartOwner) -> Result<(), ApiError> {
        self.enter(Call::ClearCart).await?;
        self.state().carts.remove(owner);
        Ok(())
    }

    async fn merge_guest_cart(&self, guest_id: &GuestId) -> Result<(), ApiError> {
        self.enter(Call::MergeGuestCart).await?;
        let mut state = self.state();
        let user = state.session.clone().ok_or(ApiError::Unauthorized)?;
        let guest_items = state
            .carts
            .remove(&CartOwner::Guest(guest_id.clone()))
            .unwrap_or_default();

        let items = state.carts.entry(CartOwner::User(user.id)).or_default();
        for (product_id, quantity) in guest_items {
            match items.iter_mut().find(|(id, _)| *id == product_id) {
                Some((_, existing)) => *existing += quantity,
                None => items.push((product_id, quantity)),
            }
        }
        Ok(())
    }
}
