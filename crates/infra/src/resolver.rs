//! Tenant → backend store resolution.
//!
//! Resolution is total: every tenant value yields a store. Anything that cannot
//! be honored (no tenant, no mapping, mapping to an unregistered store) quietly
//! lands on the default store with `overridden == false`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use eventhorizon_core::{StoreDescriptor, StoreName, TenantMapping, TenantName};

use crate::registry::{RegisteredStore, StoreRegistry};

/// Outcome of resolving one call's tenant.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    entry: Arc<RegisteredStore>,
    overridden: bool,
}

impl ResolvedTarget {
    pub fn store(&self) -> &StoreDescriptor {
        self.entry.descriptor()
    }

    /// Whether an explicit tenant mapping took effect.
    ///
    /// Decided by the path taken, not by store identity: a tenant explicitly
    /// mapped to the default store is still overridden.
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    pub(crate) fn entry(&self) -> &Arc<RegisteredStore> {
        &self.entry
    }
}

#[derive(Debug)]
pub struct TenantConnectionResolver {
    registry: Arc<StoreRegistry>,
    mappings: HashMap<TenantName, StoreName>,
}

impl TenantConnectionResolver {
    pub fn new(
        registry: Arc<StoreRegistry>,
        mappings: impl IntoIterator<Item = TenantMapping>,
    ) -> Self {
        let mappings = mappings
            .into_iter()
            .map(|m| (m.tenant, m.backend_store_name))
            .collect();
        Self { registry, mappings }
    }

    pub fn registry(&self) -> &Arc<StoreRegistry> {
        &self.registry
    }

    pub fn resolve(&self, tenant: Option<&str>) -> ResolvedTarget {
        let Some(tenant) = tenant.filter(|t| !t.is_empty()) else {
            return self.fallback();
        };

        let Some(store_name) = self.mappings.get(tenant) else {
            debug!(tenant, reason = "unmapped_tenant", "falling back to default store");
            return self.fallback();
        };

        match self.registry.entry(store_name.as_str()) {
            Some(entry) => ResolvedTarget {
                entry: Arc::clone(entry),
                overridden: true,
            },
            None => {
                debug!(
                    tenant,
                    store = %store_name,
                    reason = "unknown_store",
                    "falling back to default store"
                );
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> ResolvedTarget {
        ResolvedTarget {
            entry: Arc::clone(self.registry.default_entry()),
            overridden: false,
        }
    }
}
