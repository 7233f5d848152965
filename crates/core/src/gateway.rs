//! Storage and identity boundaries.
//!
//! Request handlers depend on these traits, never on a concrete database or
//! HTTP client. `sage-kitchen-backend` provides Postgres, object-storage and
//! in-memory implementations.

use async_trait::async_trait;

use crate::account::{
    DeliveryAddress, Identity, MealPlan, MealPlanWithProduct, NewAddress, NewMealPlan, Password,
    Profile, SignUp,
};
use crate::catalog::{CatalogQuery, NewProduct, Product, ProductFields};
use crate::order::{OrderDraft, OrderSummary};
use crate::types::{AddressId, Email, MealPlanId, OrderId, OrderStatus, ProductId, UserId};
use crate::upload::ObjectKey;

/// Boxed error from a backend library.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by every gateway.
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// The addressed record does not exist (or belongs to someone else).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Sign-in failed.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Stored data could not be mapped back into domain types.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The backend itself failed (connection, query, HTTP).
    #[error("backend error: {0}")]
    Backend(#[source] BoxError),
}

impl GatewayError {
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(err.into())
    }
}

/// Shorthand for gateway results.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Menu reads.
#[async_trait]
pub trait CatalogReader: Send + Sync + 'static {
    /// Products matching `query`, newest first.
    async fn list_products(&self, query: &CatalogQuery) -> GatewayResult<Vec<Product>>;

    async fn get_product(&self, id: ProductId) -> GatewayResult<Option<Product>>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> GatewayResult<()> {
        Ok(())
    }
}

/// Menu edits (admin only).
#[async_trait]
pub trait CatalogWriter: Send + Sync + 'static {
    async fn create_product(&self, product: NewProduct) -> GatewayResult<Product>;

    /// Replace a product's editable fields. Images are left alone.
    async fn update_product(&self, id: ProductId, fields: ProductFields)
    -> GatewayResult<Product>;

    async fn delete_product(&self, id: ProductId) -> GatewayResult<()>;
}

/// Order writes.
#[async_trait]
pub trait OrderWriter: Send + Sync + 'static {
    /// Store the order header and every line as one unit.
    ///
    /// Either the whole order is persisted or nothing is.
    async fn place_order(&self, draft: &OrderDraft) -> GatewayResult<OrderId>;

    /// Set the status of exactly the order `id`.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> GatewayResult<()>;
}

/// Order reads.
#[async_trait]
pub trait OrderReader: Send + Sync + 'static {
    /// A customer's orders, newest first, optionally capped at `limit`.
    async fn orders_for_user(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> GatewayResult<Vec<OrderSummary>>;

    /// Every order with the customer's name, newest first.
    async fn all_orders(&self) -> GatewayResult<Vec<OrderSummary>>;
}

/// Object storage for uploads.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Store `bytes` under `key` and return the public URL.
    async fn put(&self, key: &ObjectKey, content_type: &str, bytes: Vec<u8>)
    -> GatewayResult<String>;

    async fn remove(&self, key: &ObjectKey) -> GatewayResult<()>;
}

/// Accounts and admin membership.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Create an account. Fails with `Conflict` if the email is taken.
    async fn sign_up(&self, request: SignUp) -> GatewayResult<Identity>;

    /// Check a password. Fails with `InvalidCredentials` on any mismatch.
    async fn sign_in(&self, email: &Email, password: &Password) -> GatewayResult<Identity>;

    async fn is_admin(&self, user_id: UserId) -> GatewayResult<bool>;
}

/// Saved dishes.
#[async_trait]
pub trait FavoriteStore: Send + Sync + 'static {
    async fn favorites(&self, user_id: UserId) -> GatewayResult<Vec<Product>>;

    /// Add a favorite. Adding one twice is not an error.
    async fn add_favorite(&self, user_id: UserId, product_id: ProductId) -> GatewayResult<()>;

    /// Returns whether a favorite was removed.
    async fn remove_favorite(&self, user_id: UserId, product_id: ProductId)
    -> GatewayResult<bool>;

    /// Flip a favorite. Returns `true` when the dish is now a favorite.
    async fn toggle_favorite(&self, user_id: UserId, product_id: ProductId) -> GatewayResult<bool> {
        if self.remove_favorite(user_id, product_id).await? {
            Ok(false)
        } else {
            self.add_favorite(user_id, product_id).await?;
            Ok(true)
        }
    }
}

/// Meal plan subscriptions.
#[async_trait]
pub trait MealPlanStore: Send + Sync + 'static {
    async fn plans_for_user(&self, user_id: UserId) -> GatewayResult<Vec<MealPlanWithProduct>>;

    /// Create a daily, active plan.
    async fn create_plan(&self, user_id: UserId, plan: NewMealPlan) -> GatewayResult<MealPlan>;

    /// Mark the owner's plan cancelled. `NotFound` for someone else's plan.
    async fn cancel_plan(&self, user_id: UserId, id: MealPlanId) -> GatewayResult<MealPlan>;
}

/// Delivery addresses.
#[async_trait]
pub trait AddressBook: Send + Sync + 'static {
    /// A customer's addresses, default first.
    async fn addresses(&self, user_id: UserId) -> GatewayResult<Vec<DeliveryAddress>>;

    /// Save an address. A new default clears the previous default.
    async fn add_address(&self, user_id: UserId, address: NewAddress)
    -> GatewayResult<DeliveryAddress>;

    /// The address if it belongs to `user_id`.
    async fn get_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> GatewayResult<Option<DeliveryAddress>>;
}

/// Customer profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// The profile, or an empty one if none was saved yet.
    async fn profile(&self, user_id: UserId) -> GatewayResult<Profile>;

    async fn update_profile(&self, user_id: UserId, profile: Profile) -> GatewayResult<Profile>;
}
