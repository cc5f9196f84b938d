//! Checkout and order history commands.

use std::io::{self, Write};

use shopper_cart::ShopperConfig;
use shopper_core::{Email, Price};

use super::{CliError, connect};

/// Turn the cart into an order and start paying for it.
///
/// Signed-in sessions pay with the account email; guests must pass one.
pub async fn checkout(config: &ShopperConfig, email: Option<&str>) -> Result<(), CliError> {
    let connected = connect(config).await?;
    let identity = connected.session.identity().current();
    let Some(owner) = identity.owner() else {
        return Err(CliError::NotSignedIn);
    };
    let email = match (email, identity.user()) {
        (Some(email), _) => Email::parse(email)?,
        (None, Some(user)) => user.email.clone(),
        (None, None) => return Err(CliError::NotSignedIn),
    };

    connected.session.cart().settle().await;
    let order = connected.client.create_order(&owner).await?;
    let payment = connected.client.initiate_payment(order.id, &email).await?;

    let mut out = io::stdout().lock();
    writeln!(out, "Order #{} ({} item(s))", order.id, order.items.len())?;
    writeln!(
        out,
        "  total {} incl. delivery {}",
        Price::new(payment.total(), config.currency),
        Price::new(payment.delivery_amount, config.currency)
    )?;
    writeln!(out, "  pay at {}", payment.redirect_url)?;
    Ok(())
}

/// Confirm a payment by its transaction reference.
pub async fn confirm(config: &ShopperConfig, tx_ref: &str) -> Result<(), CliError> {
    let connected = connect(config).await?;
    let receipt = connected.client.confirm_payment(tx_ref).await?;

    let mut out = io::stdout().lock();
    writeln!(
        out,
        "Order #{} {} ({}), receipt sent to {}",
        receipt.order_id,
        receipt.status,
        Price::new(receipt.amount + receipt.delivery_amount, config.currency),
        receipt.user_email
    )?;
    Ok(())
}

/// Print the signed-in user's paid orders.
pub async fn history(config: &ShopperConfig) -> Result<(), CliError> {
    let connected = connect(config).await?;
    let identity = connected.session.identity().current();
    let user = identity.user().ok_or(CliError::NotSignedIn)?;
    let orders = connected.client.order_history(&user.id).await?;

    let mut out = io::stdout().lock();
    if orders.is_empty() {
        writeln!(out, "No orders yet")?;
        return Ok(());
    }
    for order in orders {
        writeln!(
            out,
            "{} {:<10} {:>12}  {}",
            order.date.format("%Y-%m-%d"),
            order.status,
            Price::new(order.total_amount_paid, config.currency),
            order.transaction_ref
        )?;
        for item in &order.items {
            writeln!(out, "    {} x {}", item.quantity, item.product_name)?;
        }
    }
    Ok(())
}
