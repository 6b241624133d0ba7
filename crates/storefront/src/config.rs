//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (session storage)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_API_URL` - Base URL of the storefront API (products + payment).
//!   When unset, catalog and checkout calls fail with a configuration error.
//! - `STOREFRONT_API_PRODUCTS_PATH` - Products endpoint (default: products.php)
//! - `STOREFRONT_API_PAYMENT_PATH` - Order/payment endpoint (default: payment.php)
//! - `STOREFRONT_API_TIMEOUT_SECS` - Request timeout (default: 15)
//! - `STOREFRONT_PRODUCT_CACHE_TTL_SECS` - Product cache TTL (default: 300)
//! - `STOREFRONT_SHIPPING_COST` - Flat shipping added at checkout (default: 15.00)
//! - `STOREFRONT_CURRENCY` - Order currency (default: USD)
//! - `STOREFRONT_DEFAULT_COUNTRY` - Pre-filled checkout country (default: NG)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use petal_core::{CountryCode, CurrencyCode};
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default path of the products endpoint, relative to the API base.
pub const DEFAULT_PRODUCTS_PATH: &str = "products.php";

/// Default path of the payment endpoint, relative to the API base.
pub const DEFAULT_PAYMENT_PATH: &str = "payment.php";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
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
    /// Storefront API configuration
    pub backend: BackendConfig,
    /// Checkout pricing and defaults
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Storefront API (products and payment) configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API base URL, always ending in `/`. `None` when not configured.
    pub base_url: Option<Url>,
    /// Products endpoint path relative to `base_url`
    pub products_path: String,
    /// Payment endpoint path relative to `base_url`
    pub payment_path: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// How long product responses stay cached
    pub cache_ttl: Duration,
}

/// Checkout pricing configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Flat shipping cost added to every order
    pub shipping_cost: Decimal,
    /// Currency sent with every order
    pub currency: CurrencyCode,
    /// Country pre-filled on the checkout form
    pub default_country: CountryCode,
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
        let host = parse_env_or_default::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            backend: BackendConfig::from_env()?,
            checkout: CheckoutConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Configuration with default paths and timeouts for the given base URL.
    #[must_use]
    pub fn new(base_url: Option<Url>) -> Self {
        Self {
            base_url: base_url.map(with_trailing_slash),
            products_path: DEFAULT_PRODUCTS_PATH.to_string(),
            payment_path: DEFAULT_PAYMENT_PATH.to_string(),
            timeout: Duration::from_secs(15),
            cache_ttl: Duration::from_secs(300),
        }
    }

    /// Load the storefront API settings from environment variables.
    ///
    /// A missing `STOREFRONT_API_URL` is not an error here: the client
    /// reports it on first use so the rest of the site keeps working.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a value is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_optional_env("STOREFRONT_API_URL")
            .filter(|value| !value.trim().is_empty())
            .map(|value| parse_base_url(&value))
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("STOREFRONT_API_URL".to_string(), e))?;

        if base_url.is_none() {
            tracing::warn!("STOREFRONT_API_URL is not set; catalog and checkout are unavailable");
        }

        Ok(Self {
            products_path: get_env_or_default("STOREFRONT_API_PRODUCTS_PATH", DEFAULT_PRODUCTS_PATH),
            payment_path: get_env_or_default("STOREFRONT_API_PAYMENT_PATH", DEFAULT_PAYMENT_PATH),
            timeout: Duration::from_secs(parse_env_or_default("STOREFRONT_API_TIMEOUT_SECS", "15")?),
            cache_ttl: Duration::from_secs(parse_env_or_default(
                "STOREFRONT_PRODUCT_CACHE_TTL_SECS",
                "300",
            )?),
            ..Self::new(base_url)
        })
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            shipping_cost: Decimal::new(1500, 2),
            currency: CurrencyCode::USD,
            default_country: CountryCode::default(),
        }
    }
}

impl CheckoutConfig {
    /// Load checkout pricing from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for an unparseable amount,
    /// a negative shipping cost, an unknown currency or a malformed country.
    pub fn from_env() -> Result<Self, ConfigError> {
        let shipping_cost = parse_env_or_default::<Decimal>("STOREFRONT_SHIPPING_COST", "15.00")?;
        if shipping_cost.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_SHIPPING_COST".to_string(),
                "must not be negative".to_string(),
            ));
        }

        Ok(Self {
            shipping_cost,
            currency: parse_env_or_default("STOREFRONT_CURRENCY", "USD")?,
            default_country: parse_env_or_default("STOREFRONT_DEFAULT_COUNTRY", "NG")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and normalize an API base URL.
///
/// Only `http`/`https` URLs are accepted. A trailing slash is appended so that
/// relative endpoint paths join under the base instead of replacing its last
/// segment.
///
/// # Errors
///
/// Returns a human-readable reason when the URL is unusable.
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(with_trailing_slash(url))
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("https://api.petal.shop/v1").unwrap();
        assert_eq!(url.as_str(), "https://api.petal.shop/v1/");
        assert_eq!(
            url.join(DEFAULT_PAYMENT_PATH).unwrap().as_str(),
            "https://api.petal.shop/v1/payment.php"
        );
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("http://localhost:8080/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_parse_base_url_rejects_bad_input() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("ftp://files.petal.shop").is_err());
    }

    #[test]
    fn test_backend_config_defaults() {
        let config = BackendConfig::new(Some(Url::parse("https://api.petal.shop/api").unwrap()));
        assert_eq!(config.base_url.unwrap().as_str(), "https://api.petal.shop/api/");
        assert_eq!(config.products_path, "products.php");
        assert_eq!(config.payment_path, "payment.php");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_checkout_config_default() {
        let config = CheckoutConfig::default();
        assert_eq!(config.shipping_cost, Decimal::new(15, 0));
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(config.default_country.as_str(), "NG");
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig::new(None),
            checkout: CheckoutConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_config_debug_redacts_database_url() {
        let url = SecretString::from("postgres://user:hunter2@db/petal");
        let debug_output = format!("{url:?}");
        assert!(!debug_output.contains("hunter2"));
    }
}
