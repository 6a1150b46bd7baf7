//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for the
//!   session store (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `API_BASE_URL` - Base URL of the commerce backend
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_SHOPS_FILE` - Tenant definitions (default: shops.yaml)
//! - `API_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `LOG_FORMAT` - `json` for JSON logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use bazaar_core::shop::{ShopConfigError, ShopRegistry, ShopsFile};
use bazaar_core::validate_secret_strength;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Cannot read shops file {0}: {1}")]
    ShopsFile(PathBuf, String),
    #[error("Invalid shops file: {0}")]
    Shops(#[from] ShopConfigError),
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
    /// Session signing secret
    pub session_secret: SecretString,
    /// Commerce backend location and timeout
    pub api: ApiConfig,
    /// Path of the YAML file declaring the shops served
    pub shops_file: PathBuf,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (production, staging, ...)
    pub sentry_environment: Option<String>,
}

/// Commerce backend configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Read `API_BASE_URL` and `API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is missing or the timeout is not
    /// a positive number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = get_required_env("API_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("API_BASE_URL".to_string(), e.to_string()))?;
        let timeout = get_env_or_default("API_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "API_TIMEOUT_SECS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout),
        })
    }
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

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            api: ApiConfig::from_env()?,
            shops_file: PathBuf::from(get_env_or_default("STOREFRONT_SHOPS_FILE", "shops.yaml")),
            json_logs: get_optional_env("LOG_FORMAT")
                .is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Read and validate a shops file.
///
/// # Errors
///
/// Returns `ConfigError::ShopsFile` when the file cannot be read or parsed
/// and `ConfigError::Shops` when the definitions are inconsistent.
pub fn load_shops(path: &Path) -> Result<ShopRegistry, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ShopsFile(path.to_path_buf(), e.to_string()))?;
    parse_shops(&raw).map_err(|e| match e {
        ConfigError::ShopsFile(_, reason) => ConfigError::ShopsFile(path.to_path_buf(), reason),
        other => other,
    })
}

/// Parse shop definitions from YAML text.
///
/// # Errors
///
/// See [`load_shops`].
pub fn parse_shops(yaml: &str) -> Result<ShopRegistry, ConfigError> {
    let file: ShopsFile = serde_yaml::from_str(yaml)
        .map_err(|e| ConfigError::ShopsFile(PathBuf::new(), e.to_string()))?;
    Ok(ShopRegistry::from_file(file)?)
}

// =============================================================================
// Helper Functions
// =============================================================================

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
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value)
        .map_err(|e| ConfigError::InsecureSecret(key.to_string(), e.to_string()))?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SHOPS: &str = r#"
default: acme
shops:
  - id: 1
    slug: acme
    name: Acme Goods
    hosts: ["acme.localhost", "shop.acme.test:3000"]
    currency: USD
  - id: 2
    slug: nordic
    name: Nordic Knits
    hosts: ["nordic.localhost"]
    currency: EUR
    shipping:
      flat_fee: "4.90"
      free_over: "60.00"
"#;

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_session_secret_valid_length() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_parse_shops_resolves_hosts() {
        let registry = parse_shops(SHOPS).unwrap();
        assert_eq!(registry.shops().len(), 2);
        assert_eq!(registry.resolve(Some("nordic.localhost")).slug, "nordic");
        assert_eq!(registry.resolve(Some("shop.acme.test:3000")).slug, "acme");
        assert_eq!(registry.resolve(Some("unknown.test")).slug, "acme");
    }

    #[test]
    fn test_parse_shops_rejects_unknown_default() {
        let yaml = SHOPS.replace("default: acme", "default: missing");
        let err = parse_shops(&yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Shops(ShopConfigError::UnknownDefault(_))
        ));
    }

    #[test]
    fn test_parse_shops_reports_yaml_errors() {
        assert!(matches!(
            parse_shops("shops: [").unwrap_err(),
            ConfigError::ShopsFile(_, _)
        ));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout: Duration::from_secs(10),
            },
            shops_file: PathBuf::from("shops.yaml"),
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }
}
