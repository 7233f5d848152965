//! In-process implementation of every gateway.
//!
//! Used by router and integration tests. Mirrors the Postgres
//! behavior that callers can observe: newest-first ordering, cascading
//! deletes, ownership checks and all-or-nothing order writes.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::instrument;

use sage_kitchen_core::account::{
    DeliveryAddress, Identity, MealPlan, MealPlanWithProduct, NewAddress, NewMealPlan, Password,
    Profile, SignUp,
};
use sage_kitchen_core::catalog::{CatalogQuery, NewProduct, Product, ProductFields};
use sage_kitchen_core::gateway::{
    AddressBook, CatalogReader, CatalogWriter, FavoriteStore, FileStore, GatewayError,
    GatewayResult, IdentityProvider, MealPlanStore, OrderReader, OrderWriter, ProfileStore,
};
use sage_kitchen_core::order::{OrderDraft, OrderLine, OrderSummary};
use sage_kitchen_core::upload::ObjectKey;
use sage_kitchen_core::{
    AddressId, Email, MealPlanId, MealPlanStatus, OrderId, OrderStatus, PlanFrequency, ProductId,
    UserId,
};

use crate::password::{hash_password, verify_password};

/// Scheme used for URLs of objects kept in memory.
pub const MEMORY_URL_PREFIX: &str = "memory://";

#[derive(Debug)]
struct UserRecord {
    id: UserId,
    email: Email,
    password_hash: String,
}

#[derive(Debug)]
struct StoredObject {
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    users: Vec<UserRecord>,
    profiles: HashMap<UserId, Profile>,
    admins: HashSet<UserId>,
    /// Insertion order; listings reverse it.
    products: Vec<Product>,
    orders: Vec<OrderSummary>,
    favorites: Vec<(UserId, ProductId)>,
    plans: Vec<MealPlan>,
    addresses: Vec<DeliveryAddress>,
    objects: HashMap<String, StoredObject>,
}

impl State {
    fn user_exists(&self, user_id: UserId) -> bool {
        self.users.iter().any(|u| u.id == user_id)
    }

    fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn customer_name(&self, user_id: UserId) -> Option<String> {
        self.profiles
            .get(&user_id)
            .and_then(|p| p.full_name.clone())
    }
}

/// Every gateway trait over shared in-process state.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
    fail_order_writes: AtomicBool,
    fail_uploads: AtomicBool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `place_order` calls fail with a backend error.
    pub fn fail_order_writes(&self, fail: bool) {
        self.fail_order_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `put` calls fail with a backend error.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Add a user to the admin set. Returns `false` if they already were one.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if the user does not exist.
    pub async fn grant_admin(&self, user_id: UserId) -> GatewayResult<bool> {
        let mut state = self.state.lock().await;
        if !state.user_exists(user_id) {
            return Err(GatewayError::NotFound("user"));
        }
        Ok(state.admins.insert(user_id))
    }

    /// Keys of every stored object.
    pub async fn object_keys(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut keys: Vec<String> = state.objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Content type and bytes of a stored object.
    pub async fn object(&self, key: &str) -> Option<(String, Vec<u8>)> {
        let state = self.state.lock().await;
        state
            .objects
            .get(key)
            .map(|o| (o.content_type.clone(), o.bytes.clone()))
    }
}

#[async_trait]
impl CatalogReader for MemoryBackend {
    async fn list_products(&self, query: &CatalogQuery) -> GatewayResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .iter()
            .rev()
            .filter(|p| query.matches(p))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> GatewayResult<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state.product(id).cloned())
    }
}

#[async_trait]
impl CatalogWriter for MemoryBackend {
    #[instrument(skip(self, product), fields(name = %product.fields.name))]
    async fn create_product(&self, product: NewProduct) -> GatewayResult<Product> {
        let NewProduct { fields, images } = product;
        let product = Product {
            id: ProductId::generate(),
            name: fields.name,
            description: fields.description,
            price: fields.price,
            category: fields.category,
            images,
            is_promoted: fields.is_promoted,
            discount_percentage: fields.discount_percentage,
            created_at: Utc::now(),
        };
        self.state.lock().await.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, fields: ProductFields) -> GatewayResult<Product> {
        let mut state = self.state.lock().await;
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GatewayError::NotFound("product"))?;
        product.name = fields.name;
        product.description = fields.description;
        product.price = fields.price;
        product.category = fields.category;
        product.is_promoted = fields.is_promoted;
        product.discount_percentage = fields.discount_percentage;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(GatewayError::NotFound("product"));
        }
        state.favorites.retain(|(_, product_id)| *product_id != id);
        state.plans.retain(|plan| plan.meal_id != id);
        Ok(())
    }
}

#[async_trait]
impl OrderWriter for MemoryBackend {
    #[instrument(skip(self, draft), fields(user_id = %draft.user_id, lines = draft.lines.len()))]
    async fn place_order(&self, draft: &OrderDraft) -> GatewayResult<OrderId> {
        if self.fail_order_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::backend("order writes are disabled"));
        }

        let mut state = self.state.lock().await;
        if !state.user_exists(draft.user_id) {
            return Err(GatewayError::NotFound("user"));
        }

        let id = OrderId::generate();
        let lines = draft
            .lines
            .iter()
            .map(|line| OrderLine {
                product_id: line.product_id,
                name: line.name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();
        let customer_name = state.customer_name(draft.user_id);
        state.orders.push(OrderSummary {
            id,
            user_id: draft.user_id,
            customer_name,
            total: draft.total,
            status: draft.status,
            payment_method: draft.payment_method,
            payment_status: draft.payment_status,
            payment_proof_url: draft.payment_proof_url.clone(),
            lines,
            created_at: Utc::now(),
        });

        tracing::info!(order_id = %id, total = %draft.total, "Order placed");
        Ok(id)
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(GatewayError::NotFound("order"))?;
        order.status = status;
        Ok(())
    }
}

#[async_trait]
impl OrderReader for MemoryBackend {
    async fn orders_for_user(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> GatewayResult<Vec<OrderSummary>> {
        let state = self.state.lock().await;
        let limit = limit.map_or(usize::MAX, |l| l as usize);
        Ok(state
            .orders
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn all_orders(&self) -> GatewayResult<Vec<OrderSummary>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .rev()
            .map(|order| OrderSummary {
                customer_name: state.customer_name(order.user_id),
                ..order.clone()
            })
            .collect())
    }
}

#[async_trait]
impl FileStore for MemoryBackend {
    async fn put(&self, key: &ObjectKey, content_type: &str, bytes: Vec<u8>) -> GatewayResult<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(GatewayError::backend("uploads are disabled"));
        }
        self.state.lock().await.objects.insert(
            key.as_str().to_owned(),
            StoredObject {
                content_type: content_type.to_owned(),
                bytes,
            },
        );
        Ok(format!("{MEMORY_URL_PREFIX}{key}"))
    }

    async fn remove(&self, key: &ObjectKey) -> GatewayResult<()> {
        self.state.lock().await.objects.remove(key.as_str());
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn sign_up(&self, request: SignUp) -> GatewayResult<Identity> {
        let hash = hash_password(request.password.expose())?;
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.email == request.email) {
            return Err(GatewayError::Conflict("email already registered".to_owned()));
        }

        let id = UserId::generate();
        state.users.push(UserRecord {
            id,
            email: request.email.clone(),
            password_hash: hash,
        });
        state.profiles.insert(
            id,
            Profile {
                full_name: request.full_name,
                ..Profile::default()
            },
        );
        Ok(Identity {
            user_id: id,
            email: request.email,
        })
    }

    async fn sign_in(&self, email: &Email, password: &Password) -> GatewayResult<Identity> {
        let (user_id, hash) = {
            let state = self.state.lock().await;
            let user = state
                .users
                .iter()
                .find(|u| &u.email == email)
                .ok_or(GatewayError::InvalidCredentials)?;
            (user.id, user.password_hash.clone())
        };
        verify_password(password.expose(), &hash)?;
        Ok(Identity {
            user_id,
            email: email.clone(),
        })
    }

    async fn is_admin(&self, user_id: UserId) -> GatewayResult<bool> {
        Ok(self.state.lock().await.admins.contains(&user_id))
    }
}

#[async_trait]
impl FavoriteStore for MemoryBackend {
    async fn favorites(&self, user_id: UserId) -> GatewayResult<Vec<Product>> {
        let state = self.state.lock().await;
        Ok(state
            .favorites
            .iter()
            .rev()
            .filter(|(owner, _)| *owner == user_id)
            .filter_map(|(_, product_id)| state.product(*product_id).cloned())
            .collect())
    }

    async fn add_favorite(&self, user_id: UserId, product_id: ProductId) -> GatewayResult<()> {
        let mut state = self.state.lock().await;
        if state.product(product_id).is_none() {
            return Err(GatewayError::NotFound("product"));
        }
        if !state.favorites.contains(&(user_id, product_id)) {
            state.favorites.push((user_id, product_id));
        }
        Ok(())
    }

    async fn remove_favorite(&self, user_id: UserId, product_id: ProductId) -> GatewayResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.favorites.len();
        state.favorites.retain(|entry| *entry != (user_id, product_id));
        Ok(state.favorites.len() < before)
    }
}

#[async_trait]
impl MealPlanStore for MemoryBackend {
    async fn plans_for_user(&self, user_id: UserId) -> GatewayResult<Vec<MealPlanWithProduct>> {
        let state = self.state.lock().await;
        Ok(state
            .plans
            .iter()
            .rev()
            .filter(|plan| plan.user_id == user_id)
            .map(|plan| MealPlanWithProduct {
                plan: plan.clone(),
                product: state.product(plan.meal_id).cloned(),
            })
            .collect())
    }

    async fn create_plan(&self, user_id: UserId, plan: NewMealPlan) -> GatewayResult<MealPlan> {
        let mut state = self.state.lock().await;
        if state.product(plan.meal_id).is_none() {
            return Err(GatewayError::NotFound("product"));
        }
        let plan = MealPlan {
            id: MealPlanId::generate(),
            user_id,
            meal_id: plan.meal_id,
            delivery_time: plan.delivery_time,
            frequency: PlanFrequency::Daily,
            status: MealPlanStatus::Active,
            created_at: Utc::now(),
        };
        state.plans.push(plan.clone());
        Ok(plan)
    }

    async fn cancel_plan(&self, user_id: UserId, id: MealPlanId) -> GatewayResult<MealPlan> {
        let mut state = self.state.lock().await;
        let plan = state
            .plans
            .iter_mut()
            .find(|p| p.id == id && p.user_id == user_id)
            .ok_or(GatewayError::NotFound("meal plan"))?;
        plan.status = MealPlanStatus::Cancelled;
        Ok(plan.clone())
    }
}

#[async_trait]
impl AddressBook for MemoryBackend {
    async fn addresses(&self, user_id: UserId) -> GatewayResult<Vec<DeliveryAddress>> {
        let state = self.state.lock().await;
        let mut list: Vec<DeliveryAddress> = state
            .addresses
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by_key(|a| !a.is_default);
        Ok(list)
    }

    async fn add_address(
        &self,
        user_id: UserId,
        address: NewAddress,
    ) -> GatewayResult<DeliveryAddress> {
        let mut state = self.state.lock().await;
        if !state.user_exists(user_id) {
            return Err(GatewayError::NotFound("user"));
        }
        if address.is_default {
            for existing in state.addresses.iter_mut().filter(|a| a.user_id == user_id) {
                existing.is_default = false;
            }
        }
        let address = DeliveryAddress {
            id: AddressId::generate(),
            user_id,
            address: address.address,
            phone: address.phone,
            is_default: address.is_default,
            created_at: Utc::now(),
        };
        state.addresses.push(address.clone());
        Ok(address)
    }

    async fn get_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> GatewayResult<Option<DeliveryAddress>> {
        let state = self.state.lock().await;
        Ok(state
            .addresses
            .iter()
            .find(|a| a.id == id && a.user_id == user_id)
            .cloned())
    }
}

#[async_trait]
impl ProfileStore for MemoryBackend {
    async fn profile(&self, user_id: UserId) -> GatewayResult<Profile> {
        let state = self.state.lock().await;
        Ok(state.profiles.get(&user_id).cloned().unwrap_or_default())
    }

    async fn update_profile(&self, user_id: UserId, profile: Profile) -> GatewayResult<Profile> {
        let mut state = self.state.lock().await;
        if !state.user_exists(user_id) {
            return Err(GatewayError::NotFound("user"));
        }
        state.profiles.insert(user_id, profile.clone());
        Ok(profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal_macros::dec;
    use sage_kitchen_core::catalog::Category;
    use sage_kitchen_core::order::OrderLineDraft;
    use sage_kitchen_core::{PaymentMethod, PaymentStatus, Price};

    use super::*;

    fn dish(name: &str, category: Category) -> NewProduct {
        NewProduct::new(
            ProductFields {
                name: name.to_owned(),
                description: None,
                price: Price::try_new(dec!(12.00)).unwrap(),
                category,
                is_promoted: false,
                discount_percentage: None,
            },
            vec!["/dish.jpg".to_owned()],
        )
        .unwrap()
    }

    async fn customer(backend: &MemoryBackend, email: &str, name: &str) -> Identity {
        backend
            .sign_up(SignUp {
                email: Email::parse(email).unwrap(),
                password: Password::new("basil-and-thyme").unwrap(),
                full_name: Some(name.to_owned()),
            })
            .await
            .unwrap()
    }

    fn draft(user_id: UserId, product: &Product, quantity: u32) -> OrderDraft {
        OrderDraft {
            user_id,
            lines: vec![OrderLineDraft {
                product_id: product.id,
                name: product.name.clone(),
                quantity,
                unit_price: product.price,
            }],
            total: product.price.times(quantity),
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Pending,
            payment_proof_url: None,
            delivery_address_id: None,
        }
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_and_filtered() {
        let backend = MemoryBackend::new();
        backend.create_product(dish("Ramen", Category::Japanese)).await.unwrap();
        backend.create_product(dish("Pizza", Category::Italian)).await.unwrap();
        backend.create_product(dish("Udon", Category::Japanese)).await.unwrap();

        let all = backend.list_products(&CatalogQuery::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Udon", "Pizza", "Ramen"]);

        let query = CatalogQuery::from_params(Some("Japanese"), Some("ra")).unwrap();
        let filtered = backend.list_products(&query).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Ramen");
    }

    #[tokio::test]
    async fn test_sign_up_and_sign_in() {
        let backend = MemoryBackend::new();
        let identity = customer(&backend, "ada@sage.kitchen", "Ada").await;

        let again = backend
            .sign_up(SignUp {
                email: Email::parse("ADA@sage.kitchen").unwrap(),
                password: Password::new("another-secret").unwrap(),
                full_name: None,
            })
            .await;
        assert!(matches!(again, Err(GatewayError::Conflict(_))));

        let email = Email::parse("ada@sage.kitchen").unwrap();
        let signed_in = backend
            .sign_in(&email, &Password::for_sign_in("basil-and-thyme"))
            .await
            .unwrap();
        assert_eq!(signed_in.user_id, identity.user_id);

        let wrong = backend
            .sign_in(&email, &Password::for_sign_in("parsley"))
            .await;
        assert!(matches!(wrong, Err(GatewayError::InvalidCredentials)));
        assert_eq!(
            backend.profile(identity.user_id).await.unwrap().full_name.as_deref(),
            Some("Ada")
        );
    }

    #[tokio::test]
    async fn test_status_update_targets_one_order() {
        let backend = MemoryBackend::new();
        let user = customer(&backend, "bo@sage.kitchen", "Bo").await.user_id;
        let product = backend.create_product(dish("Poke", Category::Healthy)).await.unwrap();

        let first = backend.place_order(&draft(user, &product, 1)).await.unwrap();
        let second = backend.place_order(&draft(user, &product, 3)).await.unwrap();
        backend
            .update_status(first, OrderStatus::Completed)
            .await
            .unwrap();

        let orders = backend.all_orders().await.unwrap();
        assert_eq!(orders[0].id, second);
        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(orders[1].status, OrderStatus::Completed);
        assert_eq!(orders[1].customer_name.as_deref(), Some("Bo"));

        let missing = backend
            .update_status(OrderId::generate(), OrderStatus::Completed)
            .await;
        assert!(matches!(missing, Err(GatewayError::NotFound("order"))));
    }

    #[tokio::test]
    async fn test_failed_order_write_stores_nothing() {
        let backend = MemoryBackend::new();
        let user = customer(&backend, "cy@sage.kitchen", "Cy").await.user_id;
        let product = backend.create_product(dish("Burger", Category::American)).await.unwrap();

        backend.fail_order_writes(true);
        assert!(backend.place_order(&draft(user, &product, 2)).await.is_err());
        assert!(backend.orders_for_user(user, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_favorites_toggle_and_cascade() {
        let backend = MemoryBackend::new();
        let user = customer(&backend, "di@sage.kitchen", "Di").await.user_id;
        let product = backend.create_product(dish("Salad", Category::Healthy)).await.unwrap();

        assert!(backend.toggle_favorite(user, product.id).await.unwrap());
        backend.add_favorite(user, product.id).await.unwrap();
        assert_eq!(backend.favorites(user).await.unwrap().len(), 1);
        assert!(!backend.toggle_favorite(user, product.id).await.unwrap());
        assert!(backend.favorites(user).await.unwrap().is_empty());

        backend.add_favorite(user, product.id).await.unwrap();
        backend.delete_product(product.id).await.unwrap();
        assert!(backend.favorites(user).await.unwrap().is_empty());

        let missing = backend.add_favorite(user, ProductId::generate()).await;
        assert!(matches!(missing, Err(GatewayError::NotFound("product"))));
    }

    #[tokio::test]
    async fn test_new_default_address_replaces_old_one() {
        let backend = MemoryBackend::new();
        let user = customer(&backend, "ed@sage.kitchen", "Ed").await.user_id;
        let first = backend
            .add_address(
                user,
                NewAddress {
                    address: "1 Sage St".to_owned(),
                    phone: "555-0101".to_owned(),
                    is_default: true,
                },
            )
            .await
            .unwrap();
        let second = backend
            .add_address(
                user,
                NewAddress {
                    address: "2 Basil Rd".to_owned(),
                    phone: "555-0102".to_owned(),
                    is_default: true,
                },
            )
            .await
            .unwrap();

        let list = backend.addresses(user).await.unwrap();
        assert_eq!(list[0].id, second.id);
        assert!(list[0].is_default);
        assert!(!list[1].is_default);

        let stranger = UserId::generate();
        assert!(backend.get_address(stranger, first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_plan_checks_owner() {
        let backend = MemoryBackend::new();
        let owner = customer(&backend, "fa@sage.kitchen", "Fa").await.user_id;
        let product = backend.create_product(dish("Sushi", Category::Japanese)).await.unwrap();
        let plan = backend
            .create_plan(owner, NewMealPlan::new(product.id, Some("18:30")).unwrap())
            .await
            .unwrap();
        assert_eq!(plan.status, MealPlanStatus::Active);

        let stranger = UserId::generate();
        let result = backend.cancel_plan(stranger, plan.id).await;
        assert!(matches!(result, Err(GatewayError::NotFound("meal plan"))));

        let cancelled = backend.cancel_plan(owner, plan.id).await.unwrap();
        assert_eq!(cancelled.status, MealPlanStatus::Cancelled);
        let plans = backend.plans_for_user(owner).await.unwrap();
        assert_eq!(plans[0].product.as_ref().map(|p| p.id), Some(product.id));
    }

    #[tokio::test]
    async fn test_objects_round_trip() {
        let backend = MemoryBackend::new();
        let key = ObjectKey::from_raw("user/payment-proofs/abc.pdf");
        let url = backend
            .put(&key, "application/pdf", b"%PDF".to_vec())
            .await
            .unwrap();
        assert_eq!(url, "memory://user/payment-proofs/abc.pdf");
        assert_eq!(
            backend.object(key.as_str()).await,
            Some(("application/pdf".to_owned(), b"%PDF".to_vec()))
        );
        backend.remove(&key).await.unwrap();
        assert!(backend.object_keys().await.is_empty());
    }
}
