//! Checkout: delivery address selection.
//!
//! Placing the order itself happens in [`super::payment`].

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use sage_kitchen_core::AddressId;
use sage_kitchen_core::account::{DeliveryAddress, NewAddress, preselect_address};
use sage_kitchen_core::order::OrderError;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::session::{checkout_address, load_cart, set_checkout_address};
use crate::routes::cart::CartView;
use crate::state::AppState;

/// Everything the checkout step needs.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub addresses: Vec<DeliveryAddress>,
    pub selected_address_id: Option<AddressId>,
    pub cart: CartView,
}

/// Address selection request.
#[derive(Debug, Deserialize)]
pub struct SelectAddress {
    pub address_id: Option<AddressId>,
}

/// Show saved addresses and the current selection.
///
/// The selection is the one stored in the session if it still exists,
/// otherwise the default address, otherwise the first one.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CheckoutView>> {
    let cart = load_cart(&session).await?;
    if cart.is_empty() {
        return Err(AppError::Checkout(OrderError::EmptyCart.into()));
    }

    let addresses = state.gateways().addresses.addresses(user.id).await?;
    let stored = checkout_address(&session).await?;
    let selected_address_id = stored
        .filter(|id| addresses.iter().any(|a| a.id == *id))
        .or_else(|| preselect_address(&addresses).map(|a| a.id));

    Ok(Json(CheckoutView {
        addresses,
        selected_address_id,
        cart: CartView::from(&cart),
    }))
}

/// Save a new delivery address and select it.
#[instrument(skip(state, session, user, request), fields(user_id = %user.id))]
pub async fn add_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(request): Json<NewAddress>,
) -> Result<(StatusCode, Json<DeliveryAddress>)> {
    let request = request.validate()?;
    let address = state
        .gateways()
        .addresses
        .add_address(user.id, request)
        .await?;
    set_checkout_address(&session, address.id).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// Confirm the delivery address and move on to payment.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn select_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(request): Json<SelectAddress>,
) -> Result<StatusCode> {
    if load_cart(&session).await?.is_empty() {
        return Err(AppError::Checkout(OrderError::EmptyCart.into()));
    }
    let address_id = request
        .address_id
        .ok_or_else(|| AppError::BadRequest("Please select a delivery address".to_string()))?;

    state
        .gateways()
        .addresses
        .get_address(user.id, address_id)
        .await?
        .ok_or_else(|| AppError::NotFound("delivery address".to_string()))?;

    set_checkout_address(&session, address_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
