//! Menu browsing.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use sage_kitchen_core::ProductId;
use sage_kitchen_core::catalog::{CatalogQuery, Product};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Category name, or `All`.
    pub category: Option<String>,
    /// Name search.
    pub q: Option<String>,
}

/// List the menu, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>> {
    let query = CatalogQuery::from_params(params.category.as_deref(), params.q.as_deref())?;
    let products = state.gateways().catalog.list_products(&query).await?;
    Ok(Json(products))
}

/// One product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .gateways()
        .catalog
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("product".to_string()))
}
