//! Startup wiring: config → registry → resolver → context → repositories → listener.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use eventhorizon_core::{ConfigError, StoreDescriptor};

use crate::config::RoutingConfig;
use crate::context::ScopedConnectionContext;
use crate::listeners::StoreMonitoredTags;
use crate::registry::StoreRegistry;
use crate::repositories::{RoutedJobRepository, RoutedTagRepository};
use crate::resolver::TenantConnectionResolver;
use crate::store::{InMemoryStore, Store, StoreError};

/// Opens a client for one configured store.
pub trait StoreConnector {
    fn connect(&self, descriptor: &StoreDescriptor) -> Result<Arc<dyn Store>, StoreError>;
}

/// Hands out in-memory stores, one per physical address.
///
/// Descriptors that point at the same host/database share a keyspace, just as
/// they would on a real server.
#[derive(Debug, Default)]
pub struct InMemoryConnector {
    stores: Mutex<HashMap<String, Arc<InMemoryStore>>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The store behind a descriptor, if it was connected.
    pub fn store(&self, descriptor: &StoreDescriptor) -> Option<Arc<InMemoryStore>> {
        self.stores.lock().ok()?.get(&descriptor.address()).cloned()
    }
}

impl StoreConnector for InMemoryConnector {
    fn connect(&self, descriptor: &StoreDescriptor) -> Result<Arc<dyn Store>, StoreError> {
        let mut stores = self.stores.lock().map_err(|_| StoreError::Poisoned)?;
        let store = stores
            .entry(descriptor.address())
            .or_insert_with(InMemoryStore::arc);
        Ok(Arc::clone(store) as Arc<dyn Store>)
    }
}

#[cfg(feature = "redis")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RedisConnector;

#[cfg(feature = "redis")]
impl StoreConnector for RedisConnector {
    fn connect(&self, descriptor: &StoreDescriptor) -> Result<Arc<dyn Store>, StoreError> {
        Ok(Arc::new(crate::store::RedisStore::open(descriptor)?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to open store `{store}`: {source}")]
    Connect { store: String, source: StoreError },
}

/// Everything the framework glue needs, built from one validated config.
#[derive(Debug, Clone)]
pub struct EventHorizon {
    context: Arc<ScopedConnectionContext>,
    jobs: Arc<RoutedJobRepository>,
    tags: Arc<RoutedTagRepository>,
}

impl EventHorizon {
    pub fn bootstrap(
        config: &RoutingConfig,
        connector: &dyn StoreConnector,
    ) -> Result<Self, BootstrapError> {
        config.validate()?;

        let mut registry = StoreRegistry::builder(config.default_store.clone());
        for descriptor in &config.stores {
            let client = connector
                .connect(descriptor)
                .map_err(|source| BootstrapError::Connect {
                    store: descriptor.name.to_string(),
                    source,
                })?;
            registry = registry.register(descriptor.clone(), client)?;
        }
        let registry = Arc::new(registry.build()?);

        info!(
            stores = registry.len(),
            tenants = config.tenants.len(),
            default_store = %config.default_store,
            "store routing configured"
        );

        let resolver = TenantConnectionResolver::new(registry, config.tenants.iter().cloned());
        let context = Arc::new(ScopedConnectionContext::new(resolver, config.prefix.clone()));
        let jobs = Arc::new(RoutedJobRepository::with_pending_minutes(
            Arc::clone(&context),
            config.trim.pending_minutes,
        ));
        let tags = Arc::new(RoutedTagRepository::new(Arc::clone(&context)));

        Ok(Self {
            context,
            jobs,
            tags,
        })
    }

    pub fn context(&self) -> &Arc<ScopedConnectionContext> {
        &self.context
    }

    pub fn jobs(&self) -> &Arc<RoutedJobRepository> {
        &self.jobs
    }

    pub fn tags(&self) -> &Arc<RoutedTagRepository> {
        &self.tags
    }

    /// The monitored-tags listener, bound to this instance's tag repository.
    pub fn monitored_tags_listener(&self) -> StoreMonitoredTags<Arc<RoutedTagRepository>> {
        StoreMonitoredTags::new(Arc::clone(&self.tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use eventhorizon_core::{JobPayload, TenantMapping};

    use crate::repositories::JobRepository;

    #[test]
    fn shared_address_shares_keyspace() {
        let connector = InMemoryConnector::new();
        let horizon = StoreDescriptor::new("horizon", 0);
        let auth = StoreDescriptor::new("service_auth", 0);
        let billing = StoreDescriptor::new("service_billing", 1);

        for d in [&horizon, &auth, &billing] {
            connector.connect(d).unwrap();
        }

        let h = connector.store(&horizon).unwrap();
        let a = connector.store(&auth).unwrap();
        let b = connector.store(&billing).unwrap();
        assert!(Arc::ptr_eq(&h, &a));
        assert!(!Arc::ptr_eq(&h, &b));
    }

    #[test]
    fn bootstrap_rejects_invalid_config() {
        let config = RoutingConfig::default()
            .with_store(StoreDescriptor::new("service_auth", 0))
            .with_tenant(TenantMapping::new("auth_service", "service_auth"));

        let err = EventHorizon::bootstrap(&config, &InMemoryConnector::new()).unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::Config(ConfigError::MissingDefaultStore(_))
        ));
    }

    #[test]
    fn bootstrap_wires_prefix_and_pending_expiry() {
        let billing = StoreDescriptor::new("service_billing", 1);
        let mut config = RoutingConfig::default()
            .with_prefix("custom:")
            .with_store(StoreDescriptor::new("horizon", 0))
            .with_store(billing.clone())
            .with_tenant(TenantMapping::new("billing_service", "service_billing"));
        config.trim.pending_minutes = 5;

        let connector = InMemoryConnector::new();
        let horizon = EventHorizon::bootstrap(&config, &connector).unwrap();

        assert_eq!(horizon.context().prefix(), "custom:");
        let bound = horizon
            .context()
            .run(Some("billing_service"), || horizon.context().current());
        assert_eq!(bound.name().as_str(), "service_billing");
        assert_eq!(bound.key_prefix(), "custom:");

        let payload = JobPayload::from_json(r#"{"uuid":"expiring-job"}"#).unwrap();
        let before = Utc::now();
        horizon
            .jobs()
            .pushed(Some("billing_service"), "default", &payload)
            .unwrap();

        let expires_at = connector
            .store(&billing)
            .unwrap()
            .expires_at("custom:expiring-job")
            .unwrap();
        assert!(expires_at >= before + Duration::minutes(5));
        assert!(expires_at <= Utc::now() + Duration::minutes(5));
    }
}
