//! Order history.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use sage_kitchen_core::order::OrderSummary;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// An order with its one-line item summary.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: OrderSummary,
    /// e.g. `"Ramen (2), Gyoza (1)"`
    pub items: String,
}

impl From<OrderSummary> for OrderView {
    fn from(order: OrderSummary) -> Self {
        let items = order.items_label();
        Self { order, items }
    }
}

/// The signed-in user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = state
        .gateways()
        .order_history
        .orders_for_user(user.id, None)
        .await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}
