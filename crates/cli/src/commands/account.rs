//! Account commands.

use std::io::{self, Write};

use secrecy::SecretString;
use shopper_cart::ShopperConfig;
use shopper_cart::api::ShopperClient;
use shopper_core::Email;

use super::{CliError, connect, describe_identity};

/// Print the resolved identity.
pub async fn whoami(config: &ShopperConfig) -> Result<(), CliError> {
    let connected = connect(config).await?;
    let state = connected.session.identity().state();

    let mut out = io::stdout().lock();
    writeln!(out, "{}", describe_identity(&state.active()))?;
    if let (Some(_), Some(guest_id)) = (&state.user, &state.guest_id) {
        writeln!(out, "  unmerged guest id: {guest_id}")?;
    }
    Ok(())
}

/// Create an account.
pub async fn register(
    config: &ShopperConfig,
    username: &str,
    email: &str,
    password: SecretString,
) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let client = ShopperClient::new(config)?;
    let user = client.register(username, &email, &password).await?;

    let mut out = io::stdout().lock();
    writeln!(out, "Registered {} ({})", user.email, user.id)?;
    Ok(())
}
