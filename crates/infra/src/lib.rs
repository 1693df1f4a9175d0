//! Infrastructure layer: store routing, scoped connections, repositories, wiring.

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod listeners;
pub mod registry;
pub mod repositories;
pub mod resolver;
pub mod store;
pub mod workers;


pub use bootstrap::{BootstrapError, EventHorizon, InMemoryConnector, StoreConnector};
#[cfg(feature = "redis")]
pub use bootstrap::RedisConnector;
pub use config::RoutingConfig;
pub use context::{Connection, ScopedConnectionContext};
pub use listeners::StoreMonitoredTags;
pub use registry::{RegisteredStore, StoreRegistry, StoreRegistryBuilder};
pub use repositories::{JobRepository, RoutedJobRepository, RoutedTagRepository, TagRepository};
pub use resolver::{ResolvedTarget, TenantConnectionResolver};
pub use store::{InMemoryStore, JobRecord, Store, StoreError};
pub use workers::{ListenerWorker, WorkerHandle};
