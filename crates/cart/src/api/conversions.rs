//! Conversions from wire payloads into domain models.

use tracing::debug;

use crate::models::{Cart, CartLine, Product, ProductSummary};

use super::types::{
    CatalogProduct, ListedProduct, RemoteCart, RemoteCartItem, RemoteInventory, SearchHit,
};

fn stock(inventory: Option<&RemoteInventory>) -> u32 {
    inventory
        .map(|i| u32::try_from(i.quantity_available).unwrap_or(0))
        .unwrap_or(0)
}

/// Map a server line, or `None` if its product row is gone.
fn convert_cart_item(item: RemoteCartItem) -> Option<CartLine> {
    let Some(product) = item.product else {
        debug!(product_id = %item.product_id, "server cart references a missing product");
        return None;
    };

    Some(CartLine {
        product_id: item.product_id,
        max_quantity: stock(product.inventory.as_ref()),
        name: product.name,
        unit_price: product.price,
        quantity: u32::try_from(item.quantity).unwrap_or(0),
        image_url: product.image_url,
    })
}

/// Convert a server cart, dropping lines that reference missing products or
/// would break the cart invariants.
///
/// Returns the cart and the number of dropped lines.
#[must_use]
pub fn convert_cart(remote: RemoteCart) -> (Cart, usize) {
    let total = remote.cart_items.len();
    let lines: Vec<CartLine> = remote
        .cart_items
        .into_iter()
        .filter_map(convert_cart_item)
        .collect();
    let missing = total - lines.len();

    let (cart, invalid) = Cart::from_lines(lines);
    (cart, missing + invalid)
}

pub(crate) fn convert_product(product: CatalogProduct) -> Product {
    Product {
        id: product.id,
        max_quantity: stock(product.inventory.as_ref()),
        name: product.name,
        unit_price: product.price,
        image_url: product.image_url,
        description: product.description,
        out_of_stock: product.out_of_stock,
    }
}

pub(crate) fn convert_listed_product(product: ListedProduct) -> Product {
    Product {
        id: product.id,
        name: product.name,
        unit_price: product.price,
        image_url: product.image_url,
        max_quantity: u32::try_from(product.max_quantity).unwrap_or(0),
        description: None,
        out_of_stock: product.max_quantity <= 0,
    }
}

pub(crate) fn convert_search_hit(hit: SearchHit) -> ProductSummary {
    ProductSummary {
        id: hit.id,
        name: hit.name,
        unit_price: hit.price,
        image_url: hit.image_url,
    }
}
