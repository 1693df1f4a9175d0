//! Named backend stores, including the mandatory default store.

use std::collections::HashMap;
use std::sync::Arc;

use eventhorizon_core::{ConfigError, RegistryError, StoreDescriptor, StoreName};

use crate::store::Store;

/// A descriptor together with the client that reaches it.
#[derive(Debug)]
pub struct RegisteredStore {
    descriptor: StoreDescriptor,
    client: Arc<dyn Store>,
}

impl RegisteredStore {
    pub fn descriptor(&self) -> &StoreDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &StoreName {
        &self.descriptor.name
    }

    pub fn client(&self) -> &Arc<dyn Store> {
        &self.client
    }
}

/// Immutable set of stores, populated once before any resolution happens.
#[derive(Debug)]
pub struct StoreRegistry {
    default: Arc<RegisteredStore>,
    stores: HashMap<StoreName, Arc<RegisteredStore>>,
}

impl StoreRegistry {
    pub fn builder(default_store: impl Into<StoreName>) -> StoreRegistryBuilder {
        StoreRegistryBuilder {
            default_store: default_store.into(),
            stores: HashMap::new(),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.stores.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&StoreDescriptor, RegistryError> {
        self.entry(name)
            .map(|s| s.descriptor())
            .ok_or_else(|| RegistryError::UnknownStore(StoreName::new(name)))
    }

    pub fn default_store(&self) -> &StoreDescriptor {
        self.default.descriptor()
    }

    pub(crate) fn len(&self) -> usize {
        self.stores.len()
    }

    pub(crate) fn entry(&self, name: &str) -> Option<&Arc<RegisteredStore>> {
        self.stores.get(name)
    }

    pub(crate) fn default_entry(&self) -> &Arc<RegisteredStore> {
        &self.default
    }
}

#[derive(Debug)]
pub struct StoreRegistryBuilder {
    default_store: StoreName,
    stores: HashMap<StoreName, Arc<RegisteredStore>>,
}

impl StoreRegistryBuilder {
    pub fn register(
        mut self,
        descriptor: StoreDescriptor,
        client: Arc<dyn Store>,
    ) -> Result<Self, ConfigError> {
        if self.stores.contains_key(&descriptor.name) {
            return Err(ConfigError::DuplicateStore(descriptor.name));
        }
        let name = descriptor.name.clone();
        self.stores
            .insert(name, Arc::new(RegisteredStore { descriptor, client }));
        Ok(self)
    }

    /// Fails fast when the default store was never registered.
    pub fn build(self) -> Result<StoreRegistry, ConfigError> {
        let default = self
            .stores
            .get(&self.default_store)
            .cloned()
            .ok_or(ConfigError::MissingDefaultStore(self.default_store))?;

        Ok(StoreRegistry {
            default,
            stores: self.stores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn registry() -> StoreRegistry {
        StoreRegistry::builder("horizon")
            .register(StoreDescriptor::new("horizon", 0), InMemoryStore::arc())
            .unwrap()
            .register(StoreDescriptor::new("service_billing", 1), InMemoryStore::arc())
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn looks_up_registered_stores() {
        let registry = registry();

        assert!(registry.has("service_billing"));
        assert!(!registry.has("service_auth"));
        assert_eq!(registry.get("service_billing").unwrap().database_index, 1);
        assert_eq!(registry.default_store().name.as_str(), "horizon");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unknown_store_is_an_error_on_get() {
        let registry = registry();
        assert_eq!(
            registry.get("non_existent_redis"),
            Err(RegistryError::UnknownStore(StoreName::new("non_existent_redis")))
        );
    }

    #[test]
    fn missing_default_store_is_fatal() {
        let err = StoreRegistry::builder("horizon")
            .register(StoreDescriptor::new("service_auth", 0), InMemoryStore::arc())
            .unwrap()
            .build()
            .unwrap_err();

        assert_eq!(err, ConfigError::MissingDefaultStore(StoreName::horizon()));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = StoreRegistry::builder("horizon")
            .register(StoreDescriptor::new("horizon", 0), InMemoryStore::arc())
            .unwrap()
            .register(StoreDescriptor::new("horizon", 3), InMemoryStore::arc())
            .unwrap_err();

        assert_eq!(err, ConfigError::DuplicateStore(StoreName::horizon()));
    }
}
