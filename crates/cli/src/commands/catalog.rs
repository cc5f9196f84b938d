//! Catalog commands.

use std::io::{self, Write};

use shopper_cart::api::ShopperClient;
use shopper_cart::ShopperConfig;
use shopper_cart::models::effective_max_quantity;
use shopper_core::{Price, ProductId};

use super::CliError;

/// Print one product.
pub async fn show(config: &ShopperConfig, product_id: ProductId) -> Result<(), CliError> {
    let client = ShopperClient::new(config)?;
    let product = client.get_product(product_id).await?;

    let mut out = io::stdout().lock();
    writeln!(out, "#{} {}", product.id, product.name)?;
    writeln!(out, "  price: {}", Price::new(product.unit_price, config.currency))?;
    if product.out_of_stock {
        writeln!(out, "  out of stock")?;
    } else {
        writeln!(
            out,
            "  up to {} per order",
            effective_max_quantity(product.max_quantity)
        )?;
    }
    if let Some(description) = &product.description {
        writeln!(out, "  {description}")?;
    }
    if let Some(image_url) = &product.image_url {
        writeln!(out, "  image: {image_url}")?;
    }
    Ok(())
}

/// Print search hits.
pub async fn search(config: &ShopperConfig, query: &str) -> Result<(), CliError> {
    let client = ShopperClient::new(config)?;
    let hits = client.search_products(query).await?;

    let mut out = io::stdout().lock();
    if hits.is_empty() {
        writeln!(out, "No products match \"{query}\"")?;
        return Ok(());
    }
    for hit in hits {
        writeln!(
            out,
            "#{:<6} {:<32} {:>12}",
            hit.id,
            hit.name,
            Price::new(hit.unit_price, config.currency)
        )?;
    }
    Ok(())
}

/// Print one page of the product listing.
pub async fn list(config: &ShopperConfig, page: u32, limit: u32) -> Result<(), CliError> {
    let client = ShopperClient::new(config)?;
    let listing = client.list_products(page, limit).await?;

    let mut out = io::stdout().lock();
    for product in &listing.products {
        let stock = if product.out_of_stock { "  (out of stock)" } else { "" };
        writeln!(
            out,
            "#{:<6} {:<32} {:>12}{stock}",
            product.id,
            product.name,
            Price::new(product.unit_price, config.currency)
        )?;
    }
    writeln!(out, "page {} of {}", listing.page, listing.total_pages)?;
    Ok(())
}
