//! Application state shared across handlers.

use std::sync::Arc;

use sage_kitchen_backend::Gateways;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Gateways>,
}

impl AppState {
    #[must_use]
    pub fn new(gateways: Gateways) -> Self {
        Self {
            inner: Arc::new(gateways),
        }
    }

    #[must_use]
    pub fn gateways(&self) -> &Gateways {
        &self.inner
    }
}
