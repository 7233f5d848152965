//! `PostgreSQL` gateways.
//!
//! # Tables
//!
//! - `users`, `profiles`, `admins` - Accounts and admin membership
//! - `products` - The menu
//! - `orders`, `order_items` - Placed orders with price-snapshotted lines
//! - `favorites`, `meal_plans`, `delivery_addresses` - Customer records
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/backend/migrations/` and run via:
//! ```bash
//! cargo run -p sage-kitchen-cli -- migrate
//! ```

mod accounts;
mod addresses;
mod catalog;
mod favorites;
mod orders;
mod plans;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use sage_kitchen_core::GatewayError;

pub use accounts::AccountRepository;
pub use catalog::CatalogRepository;
pub use orders::OrderRepository;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Errors from repository queries.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is invalid or corrupted.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Record not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Conflict (e.g., duplicate key).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for GatewayError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => Self::backend(e),
            RepositoryError::DataCorruption(msg) => Self::DataCorruption(msg),
            RepositoryError::NotFound(what) => Self::NotFound(what),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
        }
    }
}

/// Map a unique violation to `Conflict` and a foreign-key violation to
/// `NotFound(missing)`.
fn classify(err: sqlx::Error, conflict: &str, missing: &'static str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound(missing);
        }
    }
    RepositoryError::Database(err)
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Every gateway trait, backed by one connection pool.
#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Account queries, including admin grants the gateway traits do not cover.
    #[must_use]
    pub const fn accounts(&self) -> AccountRepository<'_> {
        AccountRepository::new(&self.pool)
    }

    #[must_use]
    pub const fn catalog(&self) -> CatalogRepository<'_> {
        CatalogRepository::new(&self.pool)
    }
}
