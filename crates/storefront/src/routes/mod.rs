//! HTTP route handlers for the storefront.
//!
//! Every route speaks JSON, except `POST /payment` which takes a multipart
//! form so a proof of payment can be attached.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (catalog backend reachable)
//!
//! # Menu
//! GET    /products?category=&q=     - Product listing
//! GET    /products/{id}             - Product detail
//!
//! # Cart (session)
//! GET    /cart                      - Cart with totals
//! DELETE /cart                      - Empty the cart
//! GET    /cart/count                - Badge count
//! POST   /cart/items                - Add a dish
//! PUT    /cart/items/{id}           - Set quantity (<= 0 removes)
//! DELETE /cart/items/{id}           - Remove a dish
//!
//! # Auth
//! POST   /auth/signup               - Create account and sign in
//! POST   /auth/login                - Sign in
//! POST   /auth/logout               - Sign out
//!
//! # Checkout (requires auth)
//! GET    /checkout                  - Addresses and current selection
//! POST   /checkout                  - Confirm delivery address
//! POST   /checkout/addresses        - Add a delivery address
//! POST   /payment                   - Place the order (multipart)
//!
//! # Account (requires auth)
//! GET    /orders                    - Order history
//! GET    /favorites                 - Saved dishes
//! POST   /favorites/{product_id}    - Toggle a favorite
//! DELETE /favorites/{product_id}    - Remove a favorite
//! GET    /plans                     - Meal plans
//! POST   /plans                     - Subscribe to a dish
//! POST   /plans/{id}/cancel         - Cancel a plan
//! GET    /profile                   - Profile, recent orders, active plans
//! PUT    /profile                   - Update profile
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod favorites;
pub mod orders;
pub mod payment;
pub mod plans;
pub mod products;
pub mod profile;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route("/items/{id}", put(cart::update).delete(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::select_address))
        .route("/addresses", post(checkout::add_address))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index))
        .route("/favorites", get(favorites::index))
        .route(
            "/favorites/{product_id}",
            post(favorites::toggle).delete(favorites::remove),
        )
        .route("/plans", get(plans::index).post(plans::create))
        .route("/plans/{id}/cancel", post(plans::cancel))
        .route("/profile", get(profile::show).put(profile::update))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
        .nest("/checkout", checkout_routes())
        .route("/payment", post(payment::submit))
        .merge(account_routes())
}
