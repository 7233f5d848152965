//! Integration tests for Sage Kitchen.
//!
//! [`TestContext`] starts the storefront and the admin API on ephemeral
//! local ports, both backed by one shared [`MemoryBackend`], and tests talk
//! to them over real HTTP with `reqwest`. No database is needed.
//!
//! ```bash
//! cargo test -p sage-kitchen-integration-tests
//! ```

use std::sync::Arc;

use axum::Router;
use reqwest::Client;
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

use sage_kitchen_backend::{Gateways, MemoryBackend};
use sage_kitchen_core::Email;
use sage_kitchen_core::account::{Password, SignUp};
use sage_kitchen_core::catalog::{Category, NewProduct, Product, ProductFields};
use sage_kitchen_core::gateway::{BoxError, CatalogWriter, IdentityProvider};
use sage_kitchen_core::{Price, UserId};

/// Password used for every account created by the helpers.
pub const PASSWORD: &str = "integration-pass-1";

/// Both services running against one backend.
pub struct TestContext {
    pub backend: Arc<MemoryBackend>,
    pub storefront_url: String,
    pub admin_url: String,
}

impl TestContext {
    /// Start both services.
    ///
    /// # Errors
    ///
    /// Returns an error if a local port cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let backend = Arc::new(MemoryBackend::new());

        let storefront = sage_kitchen_storefront::app(
            sage_kitchen_storefront::state::AppState::new(Gateways::in_memory(backend.clone())),
            sage_kitchen_storefront::middleware::create_session_layer(
                MemoryStore::default(),
                false,
            ),
        );
        let admin = sage_kitchen_admin::app(
            sage_kitchen_admin::state::AppState::new(Gateways::in_memory(backend.clone())),
            sage_kitchen_admin::middleware::create_session_layer(MemoryStore::default(), false),
        );

        Ok(Self {
            storefront_url: serve(storefront).await?,
            admin_url: serve(admin).await?,
            backend,
        })
    }

    /// A client with its own cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn client() -> reqwest::Result<Client> {
        Client::builder().cookie_store(true).build()
    }

    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    #[must_use]
    pub fn admin(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// Create a user directly in the backend, optionally as an admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is invalid or taken.
    pub async fn create_user(&self, email: &str, admin: bool) -> Result<UserId, BoxError> {
        let identity = self
            .backend
            .sign_up(SignUp {
                email: Email::parse(email)?,
                password: Password::new(PASSWORD)?,
                full_name: None,
            })
            .await?;
        if admin {
            self.backend.grant_admin(identity.user_id).await?;
        }
        Ok(identity.user_id)
    }

    /// Put a dish on the menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the price is negative or the backend rejects it.
    pub async fn add_dish(
        &self,
        name: &str,
        price: Decimal,
        category: Category,
    ) -> Result<Product, BoxError> {
        let product = NewProduct::new(
            ProductFields {
                name: name.to_owned(),
                description: None,
                price: Price::try_new(price)?,
                category,
                is_promoted: false,
                discount_percentage: None,
            },
            vec![format!("/images/{name}.jpg")],
        )?;
        Ok(self.backend.create_product(product).await?)
    }
}

async fn serve(app: Router) -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}
