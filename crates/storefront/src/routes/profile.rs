//! Customer profile page.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use sage_kitchen_core::MealPlanStatus;
use sage_kitchen_core::account::{MealPlanWithProduct, Profile};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::routes::orders::OrderView;
use crate::state::AppState;

/// Orders shown on the profile page.
const RECENT_ORDERS: u32 = 5;

/// Profile page data.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user: CurrentUser,
    pub profile: Profile,
    pub recent_orders: Vec<OrderView>,
    pub active_plans: Vec<MealPlanWithProduct>,
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProfileView>> {
    let gateways = state.gateways();
    let (profile, orders, plans) = tokio::try_join!(
        gateways.profiles.profile(user.id),
        gateways
            .order_history
            .orders_for_user(user.id, Some(RECENT_ORDERS)),
        gateways.meal_plans.plans_for_user(user.id),
    )?;

    Ok(Json(ProfileView {
        user,
        profile,
        recent_orders: orders.into_iter().map(OrderView::from).collect(),
        active_plans: plans
            .into_iter()
            .filter(|p| p.plan.status == MealPlanStatus::Active)
            .collect(),
    }))
}

/// Replace the profile fields. Blank values are stored as empty.
#[instrument(skip(state, user, profile), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(profile): Json<Profile>,
) -> Result<Json<Profile>> {
    let profile = state
        .gateways()
        .profiles
        .update_profile(user.id, profile.normalized())
        .await?;
    Ok(Json(profile))
}
