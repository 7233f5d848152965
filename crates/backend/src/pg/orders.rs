//! Order placement and history.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use sage_kitchen_core::gateway::{GatewayResult, OrderReader, OrderWriter};
use sage_kitchen_core::order::{OrderDraft, OrderLine, OrderSummary};
use sage_kitchen_core::{
    OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId, UserId,
};

use super::{PgBackend, RepositoryError, classify};

const ORDER_SELECT: &str = "SELECT o.id, o.user_id, p.full_name AS customer_name, o.total, \
                                   o.status, o.payment_method, o.payment_status, \
                                   o.payment_proof_url, o.created_at \
                            FROM orders o \
                            LEFT JOIN profiles p ON p.id = o.user_id";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    customer_name: Option<String>,
    total: Price,
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    payment_proof_url: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    name: String,
    quantity: i32,
    price: Price,
}

impl TryFrom<OrderItemRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative quantity on order {}", row.order_id))
        })?;
        Ok(Self {
            product_id: row.product_id,
            name: row.name,
            quantity,
            unit_price: row.price,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert the order header and all of its lines in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any insert fails; nothing is committed.
    pub async fn insert(&self, draft: &OrderDraft) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: OrderId = sqlx::query_scalar(
            "INSERT INTO orders \
                 (user_id, total, status, payment_method, payment_status, \
                  payment_proof_url, delivery_address_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(draft.user_id)
        .bind(draft.total)
        .bind(draft.status)
        .bind(draft.payment_method)
        .bind(draft.payment_status)
        .bind(&draft.payment_proof_url)
        .bind(draft.delivery_address_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| classify(e, "order conflict", "user or address"))?;

        for line in &draft.lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                RepositoryError::Conflict(format!("quantity too large for {}", line.name))
            })?;
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, name, quantity, price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order_id)
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("order"));
        }
        Ok(())
    }

    /// Orders newest first, optionally for one user and capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        user_id: Option<UserId>,
        limit: Option<u32>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} \
             WHERE ($1::uuid IS NULL OR o.user_id = $1) \
             ORDER BY o.created_at DESC \
             LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit.map(i64::from))
        .fetch_all(self.pool)
        .await?;

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            "SELECT order_id, product_id, name, quantity, price \
             FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut lines: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for item in items {
            let order_id = item.order_id;
            lines.entry(order_id).or_default().push(item.try_into()?);
        }

        Ok(orders
            .into_iter()
            .map(|o| OrderSummary {
                lines: lines.remove(&o.id).unwrap_or_default(),
                id: o.id,
                user_id: o.user_id,
                customer_name: o.customer_name,
                total: o.total,
                status: o.status,
                payment_method: o.payment_method,
                payment_status: o.payment_status,
                payment_proof_url: o.payment_proof_url,
                created_at: o.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl OrderWriter for PgBackend {
    #[instrument(skip(self, draft), fields(user_id = %draft.user_id, lines = draft.lines.len()))]
    async fn place_order(&self, draft: &OrderDraft) -> GatewayResult<OrderId> {
        let id = OrderRepository::new(&self.pool).insert(draft).await?;
        tracing::info!(order_id = %id, total = %draft.total, "Order placed");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> GatewayResult<()> {
        Ok(OrderRepository::new(&self.pool).set_status(id, status).await?)
    }
}

#[async_trait]
impl OrderReader for PgBackend {
    #[instrument(skip(self))]
    async fn orders_for_user(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> GatewayResult<Vec<OrderSummary>> {
        Ok(OrderRepository::new(&self.pool)
            .list(Some(user_id), limit)
            .await?)
    }

    #[instrument(skip(self))]
    async fn all_orders(&self) -> GatewayResult<Vec<OrderSummary>> {
        Ok(OrderRepository::new(&self.pool).list(None, None).await?)
    }
}
