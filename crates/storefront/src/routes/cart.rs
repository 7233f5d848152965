//! Cart route handlers.
//!
//! The cart is a [`CartLedger`] kept in the session. Every handler loads it,
//! applies one ledger operation and saves it back.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use sage_kitchen_core::{
    CartLedger, LineItem, MAX_LINE_QUANTITY, Price, ProductId, QuantityChange,
};

use crate::error::{AppError, Result};
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;

/// Cart as returned to clients.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total: Price,
    pub item_count: u32,
}

/// One cart line with its computed total.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub item: LineItem,
    pub line_total: Price,
}

impl From<&CartLedger> for CartView {
    fn from(ledger: &CartLedger) -> Self {
        Self {
            items: ledger
                .items()
                .iter()
                .map(|item| CartLineView {
                    item: item.clone(),
                    line_total: item.line_total(),
                })
                .collect(),
            total: ledger.total(),
            item_count: ledger.item_count(),
        }
    }
}

/// Cart plus a notice for the shopper.
#[derive(Debug, Serialize)]
pub struct CartUpdate {
    pub message: String,
    pub cart: CartView,
}

/// Badge count.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Add to cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update quantity request.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i64,
}

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Number of dishes in the cart.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartCount {
        count: cart.item_count(),
    }))
}

/// Add a dish to the cart.
///
/// Name, price and image are copied from the catalog at this moment.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCart>,
) -> Result<Json<CartUpdate>> {
    let quantity = request.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let product = state
        .gateways()
        .catalog
        .get_product(request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;

    let mut cart = load_cart(&session).await?;
    let message = cart
        .add_quantity(product.to_candidate(), quantity)?
        .map(|line| format!("{} has been added to your cart.", line.name))
        .unwrap_or_default();
    save_cart(&session, &cart).await?;

    Ok(Json(CartUpdate {
        message,
        cart: CartView::from(&cart),
    }))
}

/// Change a line's quantity. Zero or less removes the line; an absent line
/// leaves the cart as it is. Quantities above [`MAX_LINE_QUANTITY`] are
/// rejected.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Path(id): Path<ProductId>,
    Json(request): Json<UpdateQuantity>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    let change = cart.set_quantity(id, request.quantity)?;
    if change != QuantityChange::Missing {
        save_cart(&session, &cart).await?;
    }
    Ok(Json(CartView::from(&cart)))
}

/// Remove a line. Removing an absent line is not an error.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(id): Path<ProductId>) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(id).is_some() {
        save_cart(&session, &cart).await?;
    }
    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.clear();
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}
