//! Cart and cart line types.
//!
//! [`Cart`] enforces the line invariants: every quantity is at least 1 and a
//! product appears on at most one line. Mutating methods are crate-private;
//! the cart store is the only writer.

use rust_decimal::Decimal;
use tracing::debug;

use shopper_core::ProductId;

use super::product::{Product, effective_max_quantity};

/// A single product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Product on this line (unique within a cart).
    pub product_id: ProductId,
    /// Product display name.
    pub name: String,
    /// Price of a single unit.
    pub unit_price: Decimal,
    /// Units in the cart (always >= 1).
    pub quantity: u32,
    /// Primary image URL.
    pub image_url: Option<String>,
    /// Stock ceiling for quantity edits (0 when unknown).
    pub max_quantity: u32,
}

impl CartLine {
    /// Build a new line for `product`.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.unit_price,
            quantity,
            image_url: product.image_url.clone(),
            max_quantity: effective_max_quantity(product.max_quantity),
        }
    }

    /// Clamp a requested quantity to `[1, max_quantity]`.
    #[must_use]
    pub fn clamp_quantity(&self, requested: u32) -> u32 {
        requested.clamp(1, effective_max_quantity(self.max_quantity))
    }

    /// Price of all units on the line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Ordered collection of cart lines for one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Build a cart from lines, dropping any that would break the invariants.
    ///
    /// Returns the cart and the number of dropped lines.
    #[must_use]
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> (Self, usize) {
        let mut cart = Self::default();
        let mut dropped = 0;

        for line in lines {
            if line.quantity == 0 {
                debug!(product_id = %line.product_id, "dropping cart line with zero quantity");
                dropped += 1;
            } else if cart.line(line.product_id).is_some() {
                debug!(product_id = %line.product_id, "dropping duplicate cart line");
                dropped += 1;
            } else {
                cart.lines.push(line);
            }
        }

        (cart, dropped)
    }

    /// All lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id == product_id)
    }

    /// Add units of `product`, merging into an existing line.
    ///
    /// The resulting quantity is not clamped to the stock ceiling.
    pub(crate) fn add(&mut self, product: &Product, quantity: u32) {
        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine::from_product(product, quantity)),
        }
    }

    /// Remove the line for `product_id`, returning its position and contents.
    pub(crate) fn remove(&mut self, product_id: ProductId) -> Option<(usize, CartLine)> {
        let position = self.position(product_id)?;
        Some((position, self.lines.remove(position)))
    }

    /// Put a previously removed line back at `position`.
    ///
    /// Returns `false` without changes if the product already has a line.
    pub(crate) fn restore(&mut self, position: usize, line: CartLine) -> bool {
        if self.line(line.product_id).is_some() {
            return false;
        }
        let position = position.min(self.lines.len());
        self.lines.insert(position, line);
        true
    }

    /// Set the quantity of an existing line, returning the previous value.
    ///
    /// Quantities below 1 are raised to 1.
    pub(crate) fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Option<u32> {
        let line = self.lines.iter_mut().find(|l| l.product_id == product_id)?;
        let previous = line.quantity;
        line.quantity = quantity.max(1);
        Some(previous)
    }

    /// Remove every line.
    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }
}
