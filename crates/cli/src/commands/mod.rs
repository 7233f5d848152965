//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use sqlx::PgPool;

use sage_kitchen_backend::config::{ConfigError, get_database_url};
use sage_kitchen_backend::create_pool;

/// Errors shared by every command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `DATABASE_URL`, loading `.env` first.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();
    let database_url = get_database_url("DATABASE_URL")?;
    tracing::info!("Connecting to database...");
    Ok(create_pool(&database_url).await?)
}
