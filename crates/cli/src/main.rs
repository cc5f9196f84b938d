//! Shopper CLI - drive a storefront session from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart for the persisted guest session
//! shopper cart show
//!
//! # Add two units of product 5 as a guest
//! shopper cart add 5 -q 2
//!
//! # Sign in (merging the guest cart) and show the user's cart
//! shopper --email ada@example.com --password '...' cart show
//!
//! # Look up products
//! shopper product show 5
//! shopper product search tote
//! shopper product list --page 2
//!
//! # Check out and follow the payment link
//! shopper checkout --pay-email ada@example.com
//! shopper confirm-payment tx-42
//!
//! # Create an account
//! shopper register -u ada -e ada@example.com -p '...'
//! ```
//!
//! # Commands
//!
//! - `whoami` - Show the resolved session identity
//! - `cart` - Show or change the cart
//! - `product` - Catalog lookups
//! - `checkout` / `confirm-payment` / `orders` - Orders and payments
//! - `register` - Create an account
//!
//! Configuration comes from the environment (see `shopper_cart::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use shopper_cart::ShopperConfig;
use shopper_core::ProductId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shopper")]
#[command(author, version, about = "Shopper storefront session CLI")]
struct Cli {
    /// Sign in with this email before running the command
    #[arg(long, global = true, env = "SHOPPER_EMAIL")]
    email: Option<String>,

    /// Password for --email
    #[arg(long, global = true, env = "SHOPPER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved session identity
    Whoami,
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Catalog lookups
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Create an order from the cart and start the payment
    Checkout {
        /// Email for the payment receipt (defaults to the account email)
        #[arg(long)]
        pay_email: Option<String>,
    },
    /// Confirm a payment by its transaction reference
    ConfirmPayment { tx_ref: String },
    /// List paid orders of the signed-in user
    Orders,
    /// Create an account
    Register {
        /// Display name
        #[arg(short, long)]
        username: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart
    Show,
    /// Add a product
    Add {
        product_id: ProductId,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product's line
    Remove { product_id: ProductId },
    /// Set a line's quantity (clamped to available stock)
    Update { product_id: ProductId, quantity: u32 },
    /// Remove every line
    Clear,
}

#[derive(Subcommand)]
enum ProductAction {
    /// Show one product
    Show { product_id: ProductId },
    /// Search products by name
    Search { query: String },
    /// List the catalog page by page
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Products per page
        #[arg(long, default_value_t = 8)]
        limit: u32,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ShopperConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Errors and warnings become Sentry events; info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopper=info,shopper_cart=info,shopper_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ShopperConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: ShopperConfig) -> Result<(), commands::CliError> {
    if cli.email.is_some() {
        config.email = cli.email;
    }
    if let Some(password) = cli.password {
        config.password = Some(SecretString::from(password));
    }

    match cli.command {
        Commands::Whoami => commands::account::whoami(&config).await,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&config).await,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(&config, product_id, quantity).await,
            CartAction::Remove { product_id } => commands::cart::remove(&config, product_id).await,
            CartAction::Update {
                product_id,
                quantity,
            } => commands::cart::update(&config, product_id, quantity).await,
            CartAction::Clear => commands::cart::clear(&config).await,
        },
        Commands::Product { action } => match action {
            ProductAction::Show { product_id } => {
                commands::catalog::show(&config, product_id).await
            }
            ProductAction::Search { query } => commands::catalog::search(&config, &query).await,
            ProductAction::List { page, limit } => {
                commands::catalog::list(&config, page, limit).await
            }
        },
        Commands::Checkout { pay_email } => {
            commands::orders::checkout(&config, pay_email.as_deref()).await
        }
        Commands::ConfirmPayment { tx_ref } => commands::orders::confirm(&config, &tx_ref).await,
        Commands::Orders => commands::orders::history(&config).await,
        Commands::Register {
            username,
            email,
            password,
        } => {
            commands::account::register(&config, &username, &email, SecretString::from(password))
                .await
        }
    }
}
