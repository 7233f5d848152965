//! Sage Kitchen Storefront - public food-ordering API.
//!
//! This binary serves the storefront on port 3000.
//!
//! # Architecture
//!
//! - Axum JSON API with cookie sessions (`tower-sessions`, `PostgreSQL` store)
//! - Cart ledger kept in the session
//! - `PostgreSQL` for menu, orders and accounts, with a cached menu
//! - HTTP object storage for payment proofs

#![cfg_attr(not(test), forbid(unsafe_code))]

use tower_sessions_sqlx_store::PostgresStore;

use sage_kitchen_backend::telemetry::{self, shutdown_signal};
use sage_kitchen_backend::{Gateways, create_pool};
use sage_kitchen_storefront::config::StorefrontConfig;
use sage_kitchen_storefront::middleware::create_session_layer;
use sage_kitchen_storefront::state::AppState;

const SERVICE: &str = "storefront";

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");
    let _sentry_guard = telemetry::init(
        SERVICE,
        &config.sentry,
        "sage_kitchen_storefront=info,sage_kitchen_backend=info,tower_http=debug",
    );

    let pool = create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    // Schema changes ship through `sk-cli migrate`, never on boot.
    let session_layer = create_session_layer(PostgresStore::new(pool.clone()), config.is_secure());
    let gateways = Gateways::postgres(pool, &config.storage, Some(config.catalog_cache_ttl));

    let app = sage_kitchen_storefront::app(AppState::new(gateways), session_layer)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, menu_cache_ttl = ?config.catalog_cache_ttl, "Storefront accepting orders");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(SERVICE))
        .await
        .expect("Server error");
}
