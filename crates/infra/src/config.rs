//! Routing configuration: stores, tenant mappings and the global key prefix.
//!
//! Read once at startup (TOML document plus environment overrides) and
//! validated before anything is built from it.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use eventhorizon_core::{
    ConfigError, DEFAULT_STORE_NAME, StoreDescriptor, StoreName, TenantMapping,
};

use crate::repositories::job::DEFAULT_PENDING_MINUTES;

/// Overrides the global key prefix.
pub const ENV_PREFIX: &str = "EVENTHORIZON_PREFIX";
/// Overrides the name of the default store.
pub const ENV_DEFAULT_STORE: &str = "EVENTHORIZON_DEFAULT_STORE";

const DEFAULT_PREFIX: &str = "horizon:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimConfig {
    /// Minutes a pending job record is kept.
    #[serde(default = "default_pending_minutes")]
    pub pending_minutes: u32,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            pending_minutes: DEFAULT_PENDING_MINUTES,
        }
    }
}

fn default_pending_minutes() -> u32 {
    DEFAULT_PENDING_MINUTES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_store_name")]
    pub default_store: StoreName,
    /// Key prefix applied to calls that a tenant mapping redirected.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub stores: Vec<StoreDescriptor>,
    #[serde(default)]
    pub tenants: Vec<TenantMapping>,
    #[serde(default)]
    pub trim: TrimConfig,
}

fn default_store_name() -> StoreName {
    StoreName::new(DEFAULT_STORE_NAME)
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_store: default_store_name(),
            prefix: default_prefix(),
            stores: Vec::new(),
            tenants: Vec::new(),
            trim: TrimConfig::default(),
        }
    }
}

impl RoutingConfig {
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        toml::from_str(document).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read, parse and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_toml_str(&document)?.apply_env_overrides())
    }

    pub fn apply_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the environment in production).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(prefix) = lookup(ENV_PREFIX) {
            self.prefix = prefix;
        }
        if let Some(store) = lookup(ENV_DEFAULT_STORE).filter(|s| !s.is_empty()) {
            self.default_store = StoreName::new(store);
        }
        self
    }

    pub fn with_store(mut self, store: StoreDescriptor) -> Self {
        self.stores.push(store);
        self
    }

    pub fn with_tenant(mut self, mapping: TenantMapping) -> Self {
        self.tenants.push(mapping);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Fail fast on anything that would make routing ambiguous or impossible.
    ///
    /// Mappings to unknown stores are *not* errors: they resolve to the default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trim.pending_minutes == 0 {
            return Err(ConfigError::invalid("trim.pending_minutes", "must be positive"));
        }

        let mut names = HashSet::new();
        for store in &self.stores {
            if store.name.is_empty() {
                return Err(ConfigError::invalid("stores.name", "must not be empty"));
            }
            if !names.insert(&store.name) {
                return Err(ConfigError::DuplicateStore(store.name.clone()));
            }
        }
        if !names.contains(&self.default_store) {
            return Err(ConfigError::MissingDefaultStore(self.default_store.clone()));
        }

        let mut tenants = HashSet::new();
        for mapping in &self.tenants {
            if !tenants.insert(&mapping.tenant) {
                return Err(ConfigError::DuplicateTenant(mapping.tenant.clone()));
            }
        }

        Ok(())
    }
}
