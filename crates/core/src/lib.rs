//! `eventhorizon-core` — domain building blocks for per-tenant store routing.
//!
//! This crate contains **pure data** (no IO): identifiers, store descriptors,
//! tenant mappings, job payloads and the error model.

pub mod error;
pub mod id;
pub mod payload;
pub mod store;
pub mod tenant;

pub use error::{ConfigError, PayloadError, RegistryError};
pub use id::{DEFAULT_STORE_NAME, JobId, StoreName, TenantName};
pub use payload::JobPayload;
pub use store::StoreDescriptor;
pub use tenant::TenantMapping;
