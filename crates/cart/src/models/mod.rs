//! Domain models for the cart client.
//!
//! These types are validated domain objects, separate from the wire payloads
//! in [`crate::api::types`].

pub mod cart;
pub mod identity;
pub mod order;
pub mod product;

pub use cart::{Cart, CartLine};
pub use identity::{AuthenticatedUser, CartOwner, Identity};
pub use order::{
    Address, Order, OrderItem, OrderSummary, PaymentInitiation, PaymentReceipt, ProductPage,
};
pub use product::{DEFAULT_MAX_QUANTITY, Product, ProductSummary, effective_max_quantity};
