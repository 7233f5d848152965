//! Read-through cache for catalog queries.
//!
//! Wraps any [`CatalogReader`] and caches listings and product lookups with
//! `moka` (5-minute TTL by default). Menu edits made by the admin service
//! become visible once entries expire.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, instrument};

use sage_kitchen_core::ProductId;
use sage_kitchen_core::catalog::{CatalogQuery, Category, Product};
use sage_kitchen_core::gateway::{CatalogReader, GatewayResult};

/// Default time-to-live for cached entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache key for products and listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Products {
        category: Option<Category>,
        search: Option<String>,
    },
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Option<Box<Product>>),
    Products(Arc<Vec<Product>>),
}

/// Caching decorator over a catalog reader.
#[derive(Clone)]
pub struct CachedCatalog {
    inner: Arc<dyn CatalogReader>,
    cache: Cache<CacheKey, CacheValue>,
}

impl CachedCatalog {
    #[must_use]
    pub fn new(inner: Arc<dyn CatalogReader>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    /// Drop every cached entry.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl CatalogReader for CachedCatalog {
    #[instrument(skip(self))]
    async fn list_products(&self, query: &CatalogQuery) -> GatewayResult<Vec<Product>> {
        let key = CacheKey::Products {
            category: query.category,
            search: query.search.as_ref().map(|s| s.to_lowercase()),
        };
        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(products.as_ref().clone());
        }

        let products = self.inner.list_products(query).await?;
        self.cache
            .insert(key, CacheValue::Products(Arc::new(products.clone())))
            .await;
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn get_product(&self, id: ProductId) -> GatewayResult<Option<Product>> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(product.map(|p| *p));
        }

        let product = self.inner.get_product(id).await?;
        self.cache
            .insert(key, CacheValue::Product(product.clone().map(Box::new)))
            .await;
        Ok(product)
    }

    async fn ping(&self) -> GatewayResult<()> {
        self.inner.ping().await
    }
}
