//! Wiring of concrete backends into the gateway traits.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use sage_kitchen_core::gateway::{
    AddressBook, CatalogReader, CatalogWriter, FavoriteStore, FileStore, IdentityProvider,
    MealPlanStore, OrderReader, OrderWriter, ProfileStore,
};

use crate::cache::CachedCatalog;
use crate::config::StorageConfig;
use crate::memory::MemoryBackend;
use crate::pg::PgBackend;
use crate::storage::BucketStore;

/// One handle per gateway trait.
///
/// Services hold this instead of a database pool, so handlers can be tested
/// against [`MemoryBackend`].
#[derive(Clone)]
pub struct Gateways {
    pub catalog: Arc<dyn CatalogReader>,
    pub catalog_writer: Arc<dyn CatalogWriter>,
    pub orders: Arc<dyn OrderWriter>,
    pub order_history: Arc<dyn OrderReader>,
    pub files: Arc<dyn FileStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub favorites: Arc<dyn FavoriteStore>,
    pub meal_plans: Arc<dyn MealPlanStore>,
    pub addresses: Arc<dyn AddressBook>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl Gateways {
    /// Postgres for records and a storage bucket for uploads. With a
    /// `cache_ttl`, catalog reads go through a [`CachedCatalog`].
    #[must_use]
    pub fn postgres(pool: PgPool, storage: &StorageConfig, cache_ttl: Option<Duration>) -> Self {
        let pg = Arc::new(PgBackend::new(pool));
        let catalog: Arc<dyn CatalogReader> = match cache_ttl {
            Some(ttl) => Arc::new(CachedCatalog::new(pg.clone(), ttl)),
            None => pg.clone(),
        };
        Self {
            catalog,
            catalog_writer: pg.clone(),
            orders: pg.clone(),
            order_history: pg.clone(),
            files: Arc::new(BucketStore::new(storage)),
            identity: pg.clone(),
            favorites: pg.clone(),
            meal_plans: pg.clone(),
            addresses: pg.clone(),
            profiles: pg,
        }
    }

    /// Every gateway served by one shared [`MemoryBackend`], uncached.
    #[must_use]
    pub fn in_memory(backend: Arc<MemoryBackend>) -> Self {
        Self {
            catalog: backend.clone(),
            catalog_writer: backend.clone(),
            orders: backend.clone(),
            order_history: backend.clone(),
            files: backend.clone(),
            identity: backend.clone(),
            favorites: backend.clone(),
            meal_plans: backend.clone(),
            addresses: backend.clone(),
            profiles: backend,
        }
    }
}

impl std::fmt::Debug for Gateways {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateways").finish_non_exhaustive()
    }
}
