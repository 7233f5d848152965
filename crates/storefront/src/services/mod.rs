//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `checkout` - Turn the session cart into a stored order

pub mod checkout;

pub use checkout::{CheckoutError, CheckoutService, PaymentRequest, PlacedOrder};
