//! Product queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use sage_kitchen_core::catalog::{CatalogQuery, NewProduct, Product, ProductFields};
use sage_kitchen_core::gateway::{CatalogReader, CatalogWriter, GatewayResult};
use sage_kitchen_core::{Price, ProductId};

use super::{PgBackend, RepositoryError, escape_like};

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, images, is_promoted, \
                               discount_percentage, created_at";

#[derive(Debug, sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Price,
    category: String,
    images: Vec<String>,
    is_promoted: bool,
    discount_percentage: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = row.category.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid category in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category,
            images: row.images,
            is_promoted: row.is_promoted,
            discount_percentage: row.discount_percentage,
            created_at: row.created_at,
        })
    }
}

pub(super) fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the query, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, query: &CatalogQuery) -> Result<Vec<Product>, RepositoryError> {
        let category = query.category.map(|c| c.as_str());
        let pattern = query.search.as_deref().map(|s| format!("%{}%", escape_like(s)));

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE ($1::text IS NULL OR category = $1) \
               AND ($2::text IS NULL OR name ILIKE $2) \
             ORDER BY created_at DESC"
        ))
        .bind(category)
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Products with the given IDs, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<uuid::Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        into_products(rows)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let fields = &product.fields;
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products \
                 (name, description, price, category, images, is_promoted, discount_percentage) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.category.as_str())
        .bind(&product.images)
        .bind(fields.is_promoted)
        .bind(fields.discount_percentage)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    pub async fn update(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products \
             SET name = $2, description = $3, price = $4, category = $5, \
                 is_promoted = $6, discount_percentage = $7 \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.category.as_str())
        .bind(fields.is_promoted)
        .bind(fields.discount_percentage)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound("product"))?.try_into()
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("product"));
        }
        Ok(())
    }

    /// Number of products on the menu.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl CatalogReader for PgBackend {
    #[instrument(skip(self))]
    async fn list_products(&self, query: &CatalogQuery) -> GatewayResult<Vec<Product>> {
        Ok(CatalogRepository::new(&self.pool).list(query).await?)
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> GatewayResult<Option<Product>> {
        Ok(CatalogRepository::new(&self.pool).get(id).await?)
    }

    async fn ping(&self) -> GatewayResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

#[async_trait]
impl CatalogWriter for PgBackend {
    #[instrument(skip(self, product), fields(name = %product.fields.name))]
    async fn create_product(&self, product: NewProduct) -> GatewayResult<Product> {
        Ok(CatalogRepository::new(&self.pool).create(&product).await?)
    }

    #[instrument(skip(self, fields))]
    async fn update_product(&self, id: ProductId, fields: ProductFields) -> GatewayResult<Product> {
        Ok(CatalogRepository::new(&self.pool).update(id, &fields).await?)
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: ProductId) -> GatewayResult<()> {
        Ok(CatalogRepository::new(&self.pool).delete(id).await?)
    }
}
