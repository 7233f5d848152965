//! Meal plan subscriptions.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use tracing::instrument;

use sage_kitchen_core::account::{MealPlan, MealPlanWithProduct, NewMealPlan};
use sage_kitchen_core::gateway::{GatewayResult, MealPlanStore};
use sage_kitchen_core::{MealPlanId, MealPlanStatus, PlanFrequency, ProductId, UserId};

use super::catalog::CatalogRepository;
use super::{PgBackend, RepositoryError, classify};

const PLAN_COLUMNS: &str = "id, user_id, meal_id, delivery_time, frequency, status, created_at";

#[derive(Debug, sqlx::FromRow)]
struct MealPlanRow {
    id: MealPlanId,
    user_id: UserId,
    meal_id: ProductId,
    delivery_time: NaiveTime,
    frequency: PlanFrequency,
    status: MealPlanStatus,
    created_at: DateTime<Utc>,
}

impl From<MealPlanRow> for MealPlan {
    fn from(row: MealPlanRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            meal_id: row.meal_id,
            delivery_time: row.delivery_time,
            frequency: row.frequency,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl MealPlanStore for PgBackend {
    #[instrument(skip(self))]
    async fn plans_for_user(&self, user_id: UserId) -> GatewayResult<Vec<MealPlanWithProduct>> {
        let rows = sqlx::query_as::<_, MealPlanRow>(&format!(
            "SELECT {PLAN_COLUMNS} FROM meal_plans WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        let meal_ids: Vec<ProductId> = rows.iter().map(|r| r.meal_id).collect();
        let products: HashMap<ProductId, _> = CatalogRepository::new(&self.pool)
            .get_many(&meal_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let product = products.get(&row.meal_id).cloned();
                MealPlanWithProduct {
                    plan: row.into(),
                    product,
                }
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn create_plan(&self, user_id: UserId, plan: NewMealPlan) -> GatewayResult<MealPlan> {
        let row = sqlx::query_as::<_, MealPlanRow>(&format!(
            "INSERT INTO meal_plans (user_id, meal_id, delivery_time, frequency, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(user_id)
        .bind(plan.meal_id)
        .bind(plan.delivery_time)
        .bind(PlanFrequency::Daily)
        .bind(MealPlanStatus::Active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify(e, "meal plan conflict", "product"))?;

        tracing::info!(plan_id = %row.id, "Meal plan created");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn cancel_plan(&self, user_id: UserId, id: MealPlanId) -> GatewayResult<MealPlan> {
        let row = sqlx::query_as::<_, MealPlanRow>(&format!(
            "UPDATE meal_plans SET status = $3 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {PLAN_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(MealPlanStatus::Cancelled)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.ok_or(RepositoryError::NotFound("meal plan"))?.into())
    }
}
