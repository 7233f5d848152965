//! Delivery addresses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

use sage_kitchen_core::account::{DeliveryAddress, NewAddress};
use sage_kitchen_core::gateway::{AddressBook, GatewayResult};
use sage_kitchen_core::{AddressId, UserId};

use super::{PgBackend, RepositoryError, classify};

const ADDRESS_COLUMNS: &str = "id, user_id, address, phone, is_default, created_at";

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    address: String,
    phone: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for DeliveryAddress {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            address: row.address,
            phone: row.phone,
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AddressBook for PgBackend {
    #[instrument(skip(self))]
    async fn addresses(&self, user_id: UserId) -> GatewayResult<Vec<DeliveryAddress>> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM delivery_addresses \
             WHERE user_id = $1 \
             ORDER BY is_default DESC, created_at ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(rows.into_iter().map(DeliveryAddress::from).collect())
    }

    #[instrument(skip(self, address))]
    async fn add_address(
        &self,
        user_id: UserId,
        address: NewAddress,
    ) -> GatewayResult<DeliveryAddress> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        if address.is_default {
            sqlx::query("UPDATE delivery_addresses SET is_default = FALSE WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(RepositoryError::from)?;
        }

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "INSERT INTO delivery_addresses (user_id, address, phone, is_default) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&address.address)
        .bind(&address.phone)
        .bind(address.is_default)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(e, "address conflict", "user"))?;

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn get_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> GatewayResult<Option<DeliveryAddress>> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM delivery_addresses WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.map(DeliveryAddress::from))
    }
}
