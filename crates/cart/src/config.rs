//! Session configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPPER_BACKEND_URL` - Base URL of the storefront API (http or https)
//!
//! ## Optional
//! - `SHOPPER_STATE_DIR` - Directory for the persisted guest id (default: .shopper)
//! - `SHOPPER_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `SHOPPER_CURRENCY` - Display currency (default: NGN)
//! - `SHOPPER_EMAIL` - Account email used by the CLI to sign in
//! - `SHOPPER_PASSWORD` - Account password used by the CLI to sign in
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use shopper_core::CurrencyCode;

/// File name of the persisted guest id inside the state directory.
pub const GUEST_FILE_NAME: &str = "guest.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shopper session configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct ShopperConfig {
    /// Base URL of the storefront API
    pub backend_url: Url,
    /// Directory holding client state (guest id)
    pub state_dir: PathBuf,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// Currency prices are displayed in
    pub currency: CurrencyCode,
    /// Account email for sign-in
    pub email: Option<String>,
    /// Account password for sign-in
    pub password: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl std::fmt::Debug for ShopperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopperConfig")
            .field("backend_url", &self.backend_url.as_str())
            .field("state_dir", &self.state_dir)
            .field("request_timeout", &self.request_timeout)
            .field("currency", &self.currency)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_dsn", &self.sentry_dsn)
            .finish()
    }
}

impl ShopperConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend_url = parse_backend_url(
            "SHOPPER_BACKEND_URL",
            &get_required_env("SHOPPER_BACKEND_URL")?,
        )?;

        let state_dir = PathBuf::from(get_env_or_default("SHOPPER_STATE_DIR", ".shopper"));

        let timeout_secs = get_env_or_default("SHOPPER_REQUEST_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPPER_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let currency = get_env_or_default("SHOPPER_CURRENCY", "NGN")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPPER_CURRENCY".to_string(), e))?;

        Ok(Self {
            backend_url,
            state_dir,
            request_timeout: Duration::from_secs(timeout_secs),
            currency,
            email: get_optional_env("SHOPPER_EMAIL"),
            password: get_optional_env("SHOPPER_PASSWORD").map(SecretString::from),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Configuration for a backend at `backend_url` with default settings.
    #[must_use]
    pub fn new(backend_url: Url) -> Self {
        Self {
            backend_url,
            state_dir: PathBuf::from(".shopper"),
            request_timeout: Duration::from_secs(10),
            currency: CurrencyCode::default(),
            email: None,
            password: None,
            sentry_dsn: None,
        }
    }

    /// Path of the persisted guest id file.
    #[must_use]
    pub fn guest_file(&self) -> PathBuf {
        self.state_dir.join(GUEST_FILE_NAME)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an absolute http(s) base URL.
fn parse_backend_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute base URL".to_string(),
        ));
    }

    Ok(url)
}
