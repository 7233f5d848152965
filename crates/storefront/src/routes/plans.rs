//! Meal plan subscriptions.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use sage_kitchen_core::account::{MealPlan, MealPlanWithProduct, NewMealPlan};
use sage_kitchen_core::{GatewayError, MealPlanId, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// New plan request.
#[derive(Debug, Deserialize)]
pub struct CreatePlan {
    pub meal_id: ProductId,
    /// `HH:MM`, noon when absent.
    pub delivery_time: Option<String>,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<MealPlanWithProduct>>> {
    Ok(Json(state.gateways().meal_plans.plans_for_user(user.id).await?))
}

/// Subscribe to a dish, delivered daily.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreatePlan>,
) -> Result<(StatusCode, Json<MealPlan>)> {
    let plan = NewMealPlan::new(request.meal_id, request.delivery_time.as_deref())?;
    let plan = state
        .gateways()
        .meal_plans
        .create_plan(user.id, plan)
        .await
        .map_err(|e| match e {
            GatewayError::NotFound(_) => {
                AppError::BadRequest("Please select a meal".to_string())
            }
            other => other.into(),
        })?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Cancel one of the user's plans.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<MealPlanId>,
) -> Result<Json<MealPlan>> {
    Ok(Json(
        state.gateways().meal_plans.cancel_plan(user.id, id).await?,
    ))
}
