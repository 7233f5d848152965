//! Database migration command.
//!
//! Migrations live in `crates/backend/migrations/` and are embedded into the
//! binary at compile time.

use super::{CommandError, connect};

/// Errors from running migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../backend/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
