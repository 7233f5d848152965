//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STORAGE_URL`, `STORAGE_SERVICE_KEY` - Object storage for payment proofs
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CATALOG_CACHE_TTL_SECS` - Menu cache lifetime (default: 300)
//! - `STORAGE_BUCKET` - Bucket name (default: sage-kitchen)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;

use sage_kitchen_backend::config::{
    SentryConfig, StorageConfig, get_database_url, get_required_env, parse_env,
};

pub use sage_kitchen_backend::config::ConfigError;

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
    /// How long menu reads stay cached
    pub catalog_cache_ttl: Duration,
    pub storage: StorageConfig,
    pub sentry: SentryConfig,
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
        let host = parse_env::<IpAddr>("STOREFRONT_HOST", Some("127.0.0.1"))?;
        let port = parse_env::<u16>("STOREFRONT_PORT", Some("3000"))?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let ttl_secs = parse_env::<u64>("CATALOG_CACHE_TTL_SECS", Some("300"))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            catalog_cache_ttl: Duration::from_secs(ttl_secs),
            storage: StorageConfig::from_env()?,
            sentry: SentryConfig::from_env()?,
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
