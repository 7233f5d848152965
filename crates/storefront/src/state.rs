//! Application state shared across handlers.

use std::sync::Arc;

use sage_kitchen_backend::Gateways;

use crate::services::CheckoutService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Handlers reach storage only through the
/// gateway traits held here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    gateways: Gateways,
    checkout: CheckoutService,
}

impl AppState {
    #[must_use]
    pub fn new(gateways: Gateways) -> Self {
        let checkout = CheckoutService::new(gateways.orders.clone(), gateways.files.clone());
        Self {
            inner: Arc::new(AppStateInner { gateways, checkout }),
        }
    }

    #[must_use]
    pub fn gateways(&self) -> &Gateways {
        &self.inner.gateways
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }
}
