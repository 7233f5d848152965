//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use sage_kitchen_core::account::Identity;
use sage_kitchen_core::{AddressId, CartLedger, Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

impl From<Identity> for CurrentUser {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.user_id,
            email: identity.email,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cart ledger.
    pub const CART: &str = "cart";

    /// Key for the delivery address chosen at checkout.
    pub const CHECKOUT_ADDRESS: &str = "checkout_address";
}

/// Load the session's cart, empty on first use.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<CartLedger, tower_sessions::session::Error> {
    Ok(session
        .get::<CartLedger>(keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(
    session: &Session,
    cart: &CartLedger,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CART, cart).await
}

/// The address selected at checkout, if any.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn checkout_address(
    session: &Session,
) -> Result<Option<AddressId>, tower_sessions::session::Error> {
    session.get::<AddressId>(keys::CHECKOUT_ADDRESS).await
}

/// Remember the address selected at checkout.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_checkout_address(
    session: &Session,
    address_id: AddressId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(keys::CHECKOUT_ADDRESS, address_id).await
}
