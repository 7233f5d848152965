//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use sage_kitchen_core::account::Identity;
use sage_kitchen_core::{Email, UserId};

/// Session-stored admin identity.
///
/// Written only after the user was found in the admins table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's user ID.
    pub id: UserId,
    /// Admin's email address.
    pub email: Email,
}

impl From<Identity> for CurrentAdmin {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.user_id,
            email: identity.email,
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
