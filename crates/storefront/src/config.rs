//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (used for OAuth redirects)
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_STOREFRONT_PRIVATE_TOKEN` - Storefront API private access token
//! - `SHOPIFY_CUSTOMER_SHOP_ID` - Numeric shop ID for the Customer Account API
//! - `SHOPIFY_CUSTOMER_CLIENT_ID` - Customer Account API OAuth client ID
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STATIC_DIR` - Directory served under `/static` (default: crates/storefront/static)
//! - `STOREFRONT_CACHE_TTL_SECS` - Storefront API response cache TTL (default: 300)
//! - `SHOPIFY_API_VERSION` - API version (default: 2025-07)
//! - `SHOPIFY_STOREFRONT_PUBLIC_TOKEN` - Storefront API public access token
//! - `SHOPIFY_STOREFRONT_ENDPOINT` - Override the Storefront GraphQL endpoint
//! - `SHOPIFY_CUSTOMER_ACCOUNT_URL` - Override the Customer Account origin (default: <https://shopify.com>)
//! - `SHOPIFY_CUSTOMER_CLIENT_SECRET` - OAuth client secret (confidential clients only)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront (no trailing slash)
    pub base_url: String,
    /// TTL for cached Storefront API responses
    pub cache_ttl: Duration,
    /// Directory with CSS and other static assets
    pub static_dir: PathBuf,
    /// Shopify API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Sentry error tracking configuration
    pub sentry: SentryConfig,
}

/// Shopify Storefront and Customer Account API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2025-07)
    pub api_version: String,
    /// Storefront API endpoint override (defaults to the store domain)
    pub storefront_endpoint: Option<String>,
    /// Storefront API public access token (safe to expose in browser)
    pub storefront_public_token: Option<String>,
    /// Storefront API private access token (server-side only)
    pub storefront_private_token: SecretString,
    /// Customer Account API numeric shop ID (found in Shopify admin URL)
    pub customer_shop_id: String,
    /// Customer Account API OAuth client ID
    pub customer_client_id: String,
    /// Customer Account API OAuth client secret (confidential clients)
    pub customer_client_secret: Option<SecretString>,
    /// Customer Account origin override (defaults to `https://shopify.com`)
    pub customer_account_url: Option<String>,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_endpoint", &self.storefront_endpoint)
            .field("storefront_public_token", &self.storefront_public_token)
            .field("storefront_private_token", &"[REDACTED]")
            .field("customer_shop_id", &self.customer_shop_id)
            .field("customer_client_id", &self.customer_client_id)
            .field(
                "customer_client_secret",
                &self.customer_client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("customer_account_url", &self.customer_account_url)
            .finish()
    }
}

impl ShopifyStorefrontConfig {
    /// The Storefront GraphQL endpoint for this store.
    #[must_use]
    pub fn storefront_endpoint(&self) -> String {
        self.storefront_endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{}/api/{}/graphql.json",
                self.store, self.api_version
            )
        })
    }

    /// Origin hosting the Customer Account OAuth and GraphQL endpoints.
    #[must_use]
    pub fn customer_account_origin(&self) -> &str {
        self.customer_account_url
            .as_deref()
            .map_or("https://shopify.com", |url| url.trim_end_matches('/'))
    }
}

/// Sentry error tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN (error tracking disabled when unset)
    pub dsn: Option<String>,
    /// Environment name reported to Sentry
    pub environment: Option<String>,
    /// Error event sample rate
    pub sample_rate: f32,
    /// Performance trace sample rate
    pub traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = normalize_base_url(&get_required_env("STOREFRONT_BASE_URL")?)?;
        let cache_ttl = Duration::from_secs(parse_env("STOREFRONT_CACHE_TTL_SECS", "300")?);
        let static_dir = PathBuf::from(get_env_or_default(
            "STOREFRONT_STATIC_DIR",
            "crates/storefront/static",
        ));

        let shopify = ShopifyStorefrontConfig::from_env()?;
        let sentry = SentryConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            cache_ttl,
            static_dir,
            shopify,
            sentry,
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

impl ShopifyStorefrontConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let customer_client_secret = match get_optional_env("SHOPIFY_CUSTOMER_CLIENT_SECRET") {
            Some(value) => {
                validate_secret_strength(&value, "SHOPIFY_CUSTOMER_CLIENT_SECRET")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2025-07"),
            storefront_endpoint: get_optional_env("SHOPIFY_STOREFRONT_ENDPOINT"),
            storefront_public_token: get_optional_env("SHOPIFY_STOREFRONT_PUBLIC_TOKEN"),
            storefront_private_token: get_validated_secret("SHOPIFY_STOREFRONT_PRIVATE_TOKEN")?,
            customer_shop_id: get_required_env("SHOPIFY_CUSTOMER_SHOP_ID")?,
            customer_client_id: get_required_env("SHOPIFY_CUSTOMER_CLIENT_ID")?,
            customer_client_secret,
            customer_account_url: get_optional_env("SHOPIFY_CUSTOMER_ACCOUNT_URL"),
        })
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate the base URL and strip any trailing slash.
fn normalize_base_url(value: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(value).map_err(|e| {
        ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            "STOREFRONT_BASE_URL".to_string(),
            "must be an http(s) URL with a host".to_string(),
        ));
    }

    Ok(value.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    // Real tokens are random hex/base64 and sit well above this
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by Shopify."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shopify_config() -> ShopifyStorefrontConfig {
        ShopifyStorefrontConfig {
            store: "test.myshopify.com".to_string(),
            api_version: "2025-07".to_string(),
            storefront_endpoint: None,
            storefront_public_token: Some("public_token_value".to_string()),
            storefront_private_token: SecretString::from("super_secret_private_token"),
            customer_shop_id: "12345678901".to_string(),
            customer_client_id: "client_id_value".to_string(),
            customer_client_secret: Some(SecretString::from("super_secret_client_secret")),
            customer_account_url: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("shpat_9f3Kq2Lm8Zx4Vb7Nw1Rt6Yh0Pd5Jc", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://shop.example.org/").unwrap(),
            "https://shop.example.org"
        );
        assert!(normalize_base_url("ftp://shop.example.org").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_storefront_endpoint_default_and_override() {
        let mut config = shopify_config();
        assert_eq!(
            config.storefront_endpoint(),
            "https://test.myshopify.com/api/2025-07/graphql.json"
        );

        config.storefront_endpoint = Some("http://127.0.0.1:9999/graphql".to_string());
        assert_eq!(config.storefront_endpoint(), "http://127.0.0.1:9999/graphql");
    }

    #[test]
    fn test_customer_account_origin() {
        let mut config = shopify_config();
        assert_eq!(config.customer_account_origin(), "https://shopify.com");

        config.customer_account_url = Some("http://127.0.0.1:9999/".to_string());
        assert_eq!(config.customer_account_origin(), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_socket_addr_and_secure() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            cache_ttl: Duration::from_secs(300),
            static_dir: PathBuf::from("static"),
            shopify: shopify_config(),
            sentry: SentryConfig::default(),
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_shopify_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", shopify_config());

        // Public fields should be visible
        assert!(debug_output.contains("test.myshopify.com"));
        assert!(debug_output.contains("public_token_value"));
        assert!(debug_output.contains("client_id_value"));

        // Secret fields should be redacted
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_private_token"));
        assert!(!debug_output.contains("super_secret_client_secret"));
    }
}
