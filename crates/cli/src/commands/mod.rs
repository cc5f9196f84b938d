//! Command implementations.
//!
//! Every command opens a fresh [`Session`]: it resolves the identity from the
//! persisted guest id, signs in when credentials are configured (merging the
//! guest cart) and then acts on the cart or catalog.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;

use std::io::{self, Write};
use std::sync::Arc;

use shopper_cart::api::{ApiError, Credentials, ShopperClient};
use shopper_cart::identity::FileGuestStore;
use shopper_cart::models::{CartLine, Identity};
use shopper_cart::store::{CartError, CartSnapshot, SyncOutcome};
use shopper_cart::{Session, ShopperConfig};
use shopper_core::{CurrencyCode, Email, EmailError, Price};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Session setup or sign-in failed.
    #[error(transparent)]
    Session(#[from] shopper_cart::Error),

    /// Storefront API call failed.
    #[error("Storefront request failed: {0}")]
    Api(#[from] ApiError),

    /// The cart refused the change.
    #[error("Cart change refused: {0}")]
    Cart(#[from] CartError),

    /// The email is not usable.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The command needs a signed-in session.
    #[error("Sign in with --email and --password first")]
    NotSignedIn,

    /// `--email` given without `--password`.
    #[error("--password (or SHOPPER_PASSWORD) is required with --email")]
    MissingPassword,

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// A started session plus the client for catalog calls.
pub struct Connected {
    pub session: Session,
    pub client: ShopperClient,
}

/// Build the client and session, resolve the identity and sign in if
/// credentials are configured.
pub async fn connect(config: &ShopperConfig) -> Result<Connected, CliError> {
    let client = ShopperClient::new(config)?;
    let guests = Arc::new(FileGuestStore::new(config.guest_file()));
    let session = Session::new(Arc::new(client.clone()), guests);

    session.start().await;

    if let Some(credentials) = credentials(config)? {
        session.sign_in(&credentials).await?;
    }

    Ok(Connected { session, client })
}

fn credentials(config: &ShopperConfig) -> Result<Option<Credentials>, CliError> {
    let Some(email) = config.email.as_deref() else {
        return Ok(None);
    };
    let password = config.password.clone().ok_or(CliError::MissingPassword)?;

    Ok(Some(Credentials {
        email: Email::parse(email)?,
        password,
    }))
}

pub fn describe_identity(identity: &Identity) -> String {
    match identity {
        Identity::Unresolved => "unresolved session".to_string(),
        Identity::Guest(guest_id) => format!("guest {guest_id}"),
        Identity::Authenticated(user) if user.username.is_empty() => {
            format!("{} ({})", user.email, user.id)
        }
        Identity::Authenticated(user) => format!("{} <{}> ({})", user.username, user.email, user.id),
    }
}

fn write_line(out: &mut impl Write, line: &CartLine, currency: CurrencyCode) -> io::Result<()> {
    writeln!(
        out,
        "  #{:<6} {:<32} {:>3} x {:>12} = {:>12}",
        line.product_id,
        line.name,
        line.quantity,
        Price::new(line.unit_price, currency),
        Price::new(line.line_total(), currency),
    )
}

/// Print a cart snapshot.
pub fn print_cart(snapshot: &CartSnapshot, currency: CurrencyCode) -> io::Result<()> {
    let mut out = io::stdout().lock();

    writeln!(out, "Cart for {}", describe_identity(&snapshot.identity))?;
    if snapshot.lines.is_empty() {
        return writeln!(out, "  (empty)");
    }
    for line in &snapshot.lines {
        write_line(&mut out, line, currency)?;
    }
    writeln!(
        out,
        "  {} item(s), subtotal {}",
        snapshot.item_count,
        Price::new(snapshot.subtotal, currency)
    )
}

/// Print how the remote side of a cart change ended.
pub fn report(action: &str, outcome: &SyncOutcome) -> io::Result<()> {
    let mut out = io::stdout().lock();
    match outcome {
        SyncOutcome::Confirmed => writeln!(out, "{action}: saved"),
        SyncOutcome::RolledBack(e) => writeln!(out, "{action}: failed and undone ({e})"),
        SyncOutcome::Unreconciled(e) => {
            writeln!(out, "{action}: applied locally, server did not confirm ({e})")
        }
        SyncOutcome::Stale => writeln!(out, "{action}: session changed before the server answered"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_identity() {
        assert_eq!(describe_identity(&Identity::Unresolved), "unresolved session");
        assert_eq!(
            describe_identity(&Identity::Guest("g-1".parse().unwrap())),
            "guest g-1"
        );
    }

    #[test]
    fn test_credentials_require_password() {
        let mut config = ShopperConfig::new("http://localhost:5000".parse().unwrap());
        assert!(credentials(&config).unwrap().is_none());

        config.email = Some("ada@example.com".to_string());
        assert!(matches!(
            credentials(&config),
            Err(CliError::MissingPassword)
        ));

        config.password = Some("pw".to_string().into());
        let creds = credentials(&config).unwrap().unwrap();
        assert_eq!(creds.email.as_str(), "ada@example.com");
    }
}
