//! Sage Kitchen Admin - order and menu management API.
//!
//! This binary serves the admin API on port 3001. Only users listed in the
//! `admins` table can sign in; grant access with `sk-cli admin grant`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use tower_sessions_sqlx_store::PostgresStore;

use sage_kitchen_admin::config::AdminConfig;
use sage_kitchen_admin::middleware::create_session_layer;
use sage_kitchen_admin::state::AppState;
use sage_kitchen_backend::telemetry::{self, shutdown_signal};
use sage_kitchen_backend::{Gateways, create_pool};

const SERVICE: &str = "admin";

#[tokio::main]
async fn main() {
    let config = AdminConfig::from_env().expect("Failed to load configuration");
    let _sentry_guard = telemetry::init(
        SERVICE,
        &config.sentry,
        "sage_kitchen_admin=info,sage_kitchen_backend=info,tower_http=debug",
    );

    let pool = create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    let session_layer = create_session_layer(PostgresStore::new(pool.clone()), config.is_secure());
    // Edits must show up immediately, so menu reads skip the cache.
    let state = AppState::new(Gateways::postgres(pool, &config.storage, None));

    let app = sage_kitchen_admin::app(state, session_layer)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "Admin console ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(SERVICE))
        .await
        .expect("Server error");
}
