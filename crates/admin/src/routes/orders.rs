//! Order dashboard.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sage_kitchen_core::order::OrderSummary;
use sage_kitchen_core::{OrderId, OrderStatus};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// An order as listed on the dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardOrder {
    #[serde(flatten)]
    pub order: OrderSummary,
    pub items: String,
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdated {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub message: String,
}

/// Every order, newest first, with the customer's name.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<DashboardOrder>>> {
    let orders = state.gateways().order_history.all_orders().await?;
    Ok(Json(
        orders
            .into_iter()
            .map(|order| DashboardOrder {
                items: order.items_label(),
                order,
            })
            .collect(),
    ))
}

/// Move one order to a new status.
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(order_id): Path<OrderId>,
    Json(request): Json<StatusUpdate>,
) -> Result<Json<StatusUpdated>> {
    let status: OrderStatus = request.status.parse()?;
    state
        .gateways()
        .orders
        .update_status(order_id, status)
        .await?;
    tracing::info!(%order_id, %status, "Order status updated");

    Ok(Json(StatusUpdated {
        order_id,
        status,
        message: format!("Order status updated to {status}"),
    }))
}
