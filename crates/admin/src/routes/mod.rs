//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness
//! POST   /auth/login              - Sign in (admins only)
//! POST   /auth/logout             - Sign out
//! GET    /orders                  - All orders with customer names
//! POST   /orders/{id}/status      - Change an order's status
//! GET    /products                - Menu
//! POST   /products                - New dish (multipart with images)
//! GET    /products/{id}           - Dish detail
//! PUT    /products/{id}           - Edit a dish
//! DELETE /products/{id}           - Delete a dish
//! ```

pub mod auth;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/orders", get(orders::index))
        .route("/orders/{id}/status", post(orders::update_status))
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}
