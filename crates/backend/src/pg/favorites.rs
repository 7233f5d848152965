//! Saved dishes.

use async_trait::async_trait;
use tracing::instrument;

use sage_kitchen_core::catalog::Product;
use sage_kitchen_core::gateway::{FavoriteStore, GatewayResult};
use sage_kitchen_core::{ProductId, UserId};

use super::catalog::{ProductRow, into_products};
use super::{PgBackend, RepositoryError, classify};

#[async_trait]
impl FavoriteStore for PgBackend {
    #[instrument(skip(self))]
    async fn favorites(&self, user_id: UserId) -> GatewayResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT p.id, p.name, p.description, p.price, p.category, p.images, \
                    p.is_promoted, p.discount_percentage, p.created_at \
             FROM favorites f \
             JOIN products p ON p.id = f.product_id \
             WHERE f.user_id = $1 \
             ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(into_products(rows)?)
    }

    #[instrument(skip(self))]
    async fn add_favorite(&self, user_id: UserId, product_id: ProductId) -> GatewayResult<()> {
        sqlx::query(
            "INSERT INTO favorites (user_id, product_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "already a favorite", "product"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_favorite(&self, user_id: UserId, product_id: ProductId) -> GatewayResult<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
