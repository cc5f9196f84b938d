//! Cart commands.

use shopper_cart::ShopperConfig;
use shopper_core::ProductId;

use super::{CliError, connect, print_cart, report};

/// Print the cart.
pub async fn show(config: &ShopperConfig) -> Result<(), CliError> {
    let connected = connect(config).await?;
    print_cart(&connected.session.cart().snapshot(), config.currency)?;
    Ok(())
}

/// Look up a product and add `quantity` units.
pub async fn add(config: &ShopperConfig, product_id: ProductId, quantity: u32) -> Result<(), CliError> {
    let connected = connect(config).await?;
    let product = connected.client.get_product(product_id).await?;
    if product.out_of_stock {
        tracing::warn!(product_id = %product_id, "product is flagged out of stock");
    }

    let outcome = connected.session.cart().add_item(&product, quantity).await?;
    report(&format!("add {}", product.name), &outcome)?;
    print_cart(&connected.session.cart().snapshot(), config.currency)?;
    Ok(())
}

/// Remove a product's line.
pub async fn remove(config: &ShopperConfig, product_id: ProductId) -> Result<(), CliError> {
    let connected = connect(config).await?;
    let outcome = connected.session.cart().remove_item(product_id).await?;
    report(&format!("remove #{product_id}"), &outcome)?;
    print_cart(&connected.session.cart().snapshot(), config.currency)?;
    Ok(())
}

/// Set a line's quantity.
pub async fn update(config: &ShopperConfig, product_id: ProductId, quantity: u32) -> Result<(), CliError> {
    let connected = connect(config).await?;
    let outcome = connected
        .session
        .cart()
        .update_quantity(product_id, quantity)
        .await?;
    report(&format!("update #{product_id}"), &outcome)?;
    print_cart(&connected.session.cart().snapshot(), config.currency)?;
    Ok(())
}

/// Empty the cart.
pub async fn clear(config: &ShopperConfig) -> Result<(), CliError> {
    let connected = connect(config).await?;
    let outcome = connected.session.cart().clear_cart().await?;
    report("clear", &outcome)?;
    Ok(())
}
