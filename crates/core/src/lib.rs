//! Sage Kitchen Core - cart ledger, domain types and gateway traits.
//!
//! Shared by every Sage Kitchen component:
//! - `storefront` - Public JSON API for browsing, cart and checkout
//! - `admin` - Menu and order management API
//! - `cli` - Migrations, admin grants and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no database access and no
//! HTTP clients. Storage lives behind the traits in [`gateway`], implemented
//! by `sage-kitchen-backend`.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, emails, and statuses
//! - [`cart`] - The session-scoped cart ledger
//! - [`order`] - Order drafts built from a ledger, and stored order summaries
//! - [`catalog`] - Products, categories and catalog queries
//! - [`account`] - Identity, profiles, delivery addresses and meal plans
//! - [`upload`] - Upload validation and storage keys
//! - [`gateway`] - Async traits for every external collaborator

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod cart;
pub mod catalog;
pub mod gateway;
pub mod order;
pub mod types;
pub mod upload;

pub use cart::{
    CartError, CartLedger, LineItem, MAX_LINE_QUANTITY, ProductCandidate, QuantityChange,
};
pub use gateway::{GatewayError, GatewayResult};
pub use types::*;
