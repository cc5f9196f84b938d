//! Catalog product types.

use rust_decimal::Decimal;

use shopper_core::ProductId;

/// Stock ceiling used when the catalog does not report availability.
pub const DEFAULT_MAX_QUANTITY: u32 = 99;

/// Resolve a reported availability into a usable quantity ceiling.
///
/// Zero means "unknown" on the wire and falls back to
/// [`DEFAULT_MAX_QUANTITY`].
#[must_use]
pub const fn effective_max_quantity(reported: u32) -> u32 {
    if reported == 0 {
        DEFAULT_MAX_QUANTITY
    } else {
        reported
    }
}

/// A product as needed to create a cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Price of a single unit.
    pub unit_price: Decimal,
    /// Primary image URL.
    pub image_url: Option<String>,
    /// Units currently available (0 when unknown).
    pub max_quantity: u32,
    /// Long description.
    pub description: Option<String>,
    /// Whether the catalog flags the product as out of stock.
    pub out_of_stock: bool,
}

impl Product {
    /// Create a product with the fields a cart line needs.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, unit_price: Decimal, max_quantity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
            image_url: None,
            max_quantity,
            description: None,
            out_of_stock: false,
        }
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// A search hit (`POST /product/search`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    /// Product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Price of a single unit.
    pub unit_price: Decimal,
    /// Primary image URL.
    pub image_url: Option<String>,
}
