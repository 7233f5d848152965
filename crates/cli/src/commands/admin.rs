//! Admin access management.
//!
//! Admins are ordinary users listed in the `admins` table; they sign up
//! through the storefront first and are then granted access here.

use thiserror::Error;

use sage_kitchen_backend::pg::{AccountRepository, RepositoryError};
use sage_kitchen_core::Email;

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No user with email {0}; sign up on the storefront first")]
    UnknownUser(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Grant admin access to the user with `email`.
///
/// # Errors
///
/// Returns an error if the email is invalid, no such user exists, or the
/// database is unreachable.
pub async fn grant(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let pool = connect().await?;
    let accounts = AccountRepository::new(&pool);

    let identity = accounts
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AdminError::UnknownUser(email.to_string()))?;

    if accounts.grant_admin(identity.user_id).await? {
        tracing::info!(user_id = %identity.user_id, "Granted admin access to {email}");
    } else {
        tracing::info!("{email} is already an admin");
    }
    Ok(())
}
