//! Sage Kitchen backends.
//!
//! Implementations of the `sage-kitchen-core` gateway traits:
//!
//! - [`pg::PgBackend`] - `PostgreSQL` via `sqlx`
//! - [`storage::BucketStore`] - HTTP object storage for uploads
//! - [`cache::CachedCatalog`] - `moka` read-through cache for menu reads
//! - [`memory::MemoryBackend`] - in-process state for tests
//!
//! [`Gateways`] bundles them for the storefront and admin services, and
//! [`telemetry`] sets up their error reporting and logs.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod gateways;
pub mod memory;
mod password;
pub mod pg;
pub mod storage;
pub mod telemetry;

pub use gateways::Gateways;
pub use memory::MemoryBackend;
pub use pg::{PgBackend, create_pool};
