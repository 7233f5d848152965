//! Test harness: the storefront router over the in-memory backend.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};

use sage_kitchen_backend::{Gateways, MemoryBackend};
use sage_kitchen_core::Price;
use sage_kitchen_core::catalog::{Category, NewProduct, Product, ProductFields};
use sage_kitchen_core::gateway::CatalogWriter;
use sage_kitchen_storefront::middleware::{SESSION_COOKIE_NAME, create_session_layer};
use sage_kitchen_storefront::state::AppState;

pub const BOUNDARY: &str = "sage-kitchen-boundary";

/// A browser-like client: one router, one cookie jar with one cookie.
pub struct TestClient {
    pub backend: Arc<MemoryBackend>,
    router: Router,
    cookie: Option<String>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_session_store(MemoryStore::default())
    }

    pub fn with_session_store<S: SessionStore + Clone>(store: S) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let state = AppState::new(Gateways::in_memory(backend.clone()));
        let router = sage_kitchen_storefront::app(state, create_session_layer(store, false));
        Self {
            backend,
            router,
            cookie: None,
        }
    }

    /// A second client sharing the same backend but with no cookie.
    pub fn stranger(&self) -> Self {
        let state = AppState::new(Gateways::in_memory(self.backend.clone()));
        Self {
            backend: self.backend.clone(),
            router: sage_kitchen_storefront::app(
                state,
                create_session_layer(MemoryStore::default(), false),
            ),
            cookie: None,
        }
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .to_owned();
            if pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")) {
                self.cookie = Some(pair);
            }
        }

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, body }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn json(&mut self, method: Method, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.json(Method::POST, uri, body).await
    }

    pub async fn empty(&mut self, method: Method, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// POST a multipart form. Files are `(field, file_name, bytes)`.
    pub async fn multipart(
        &mut self,
        uri: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
    ) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(fields, files)))
                .unwrap(),
        )
        .await
    }

    pub async fn sign_up(&mut self, email: &str) -> TestResponse {
        let response = self
            .post(
                "/auth/signup",
                serde_json::json!({
                    "email": email,
                    "password": "olive-oil-2024",
                    "full_name": "Test Diner",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response
    }
}

/// In-memory session store whose next save can be made to fail once.
#[derive(Debug, Clone, Default)]
pub struct FlakySessionStore {
    inner: MemoryStore,
    fail_next_save: Arc<AtomicBool>,
}

impl FlakySessionStore {
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl SessionStore for FlakySessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        self.inner.create(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(session_store::Error::Backend("session table locked".to_owned()));
        }
        self.inner.save(record).await
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        self.inner.load(id).await
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.inner.delete(id).await
    }
}

pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn add_dish(
    backend: &MemoryBackend,
    name: &str,
    price: rust_decimal::Decimal,
    category: Category,
) -> Product {
    backend
        .create_product(
            NewProduct::new(
                ProductFields {
                    name: name.to_owned(),
                    description: Some(format!("House {name}")),
                    price: Price::try_new(price).unwrap(),
                    category,
                    is_promoted: false,
                    discount_percentage: None,
                },
                vec![format!("/images/{}.jpg", name.to_lowercase())],
            )
            .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn ten_dollar_dish(backend: &MemoryBackend) -> Product {
    add_dish(backend, "Margherita", dec!(10.00), Category::Italian).await
}
