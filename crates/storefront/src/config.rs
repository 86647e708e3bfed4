//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8082)
//! - `STOREFRONT_BASE_URL` - Public URL (default: `http://localhost:8082`); `https` enables secure cookies
//! - `DEFAULT_ADDRESS` - Address sentinel for users who have not set one (default: `ADDRESS_NOT_SET`)
//! - `DEFAULT_WALLET_MONEY` - Wallet balance given to new users (default: 500)
//! - `CATALOG_CACHE_TTL_SECS` - Product cache TTL in seconds, 0 disables (default: 300)
//! - `CART_SERIALIZE_WRITES` - Serialize cart writes per user (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use qkart_core::Money;

/// Default address sentinel.
pub const DEFAULT_ADDRESS: &str = "ADDRESS_NOT_SET";

/// Default wallet balance for new users.
pub const DEFAULT_WALLET_MONEY: u32 = 500;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Values every new account starts with.
///
/// The address doubles as the "not set" sentinel checked at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDefaults {
    /// Address given to new users.
    pub address: String,
    /// Wallet balance given to new users.
    pub wallet_money: Money,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_owned(),
            wallet_money: Money::whole(DEFAULT_WALLET_MONEY),
        }
    }
}

impl AccountDefaults {
    /// Returns `true` if `address` is the unset sentinel.
    #[must_use]
    pub fn is_default_address(&self, address: &str) -> bool {
        address == self.address
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Defaults for new accounts
    pub account: AccountDefaults,
    /// Product cache TTL (zero disables the cache)
    pub catalog_cache_ttl: Duration,
    /// Serialize cart writes per user
    pub serialize_cart_writes: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
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

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "8082")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:8082");

        let account = AccountDefaults {
            address: get_env_or_default("DEFAULT_ADDRESS", DEFAULT_ADDRESS),
            wallet_money: parse_env("DEFAULT_WALLET_MONEY", &DEFAULT_WALLET_MONEY.to_string())?,
        };

        let catalog_cache_ttl = Duration::from_secs(parse_env("CATALOG_CACHE_TTL_SECS", "300")?);
        let serialize_cart_writes = parse_env("CART_SERIALIZE_WRITES", "false")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            account,
            catalog_cache_ttl,
            serialize_cart_writes,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for local runs and tests: no database URL, defaults
    /// everywhere else.
    #[must_use]
    pub fn local() -> Self {
        Self {
            database_url: SecretString::from(""),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8082,
            base_url: "http://localhost:8082".to_owned(),
            account: AccountDefaults::default(),
            catalog_cache_ttl: Duration::ZERO,
            serialize_cart_writes: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns `true` if the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Load only the database URL, for tools that do not serve HTTP.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("STOREFRONT_DATABASE_URL")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
