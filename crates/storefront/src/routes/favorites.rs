//! Saved dishes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use sage_kitchen_core::ProductId;
use sage_kitchen_core::catalog::Product;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Result of toggling a favorite.
#[derive(Debug, Serialize)]
pub struct FavoriteState {
    pub product_id: ProductId,
    pub favorite: bool,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.gateways().favorites.favorites(user.id).await?))
}

/// Flip a dish in or out of the favorites.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<FavoriteState>> {
    let favorite = state
        .gateways()
        .favorites
        .toggle_favorite(user.id, product_id)
        .await?;
    Ok(Json(FavoriteState {
        product_id,
        favorite,
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    state
        .gateways()
        .favorites
        .remove_favorite(user.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
