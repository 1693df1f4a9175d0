use serde::{Deserialize, Serialize};

use crate::id::StoreName;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;

/// Identifies one backend store: a named host/database pair.
///
/// Built once while loading configuration and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDescriptor {
    pub name: StoreName,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, alias = "database")]
    pub database_index: u32,
    /// Key namespace used when the store is reached without a tenant override.
    #[serde(default, alias = "prefix")]
    pub key_prefix: Option<String>,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl StoreDescriptor {
    pub fn new(name: impl Into<StoreName>, database_index: u32) -> Self {
        Self {
            name: name.into(),
            host: default_host(),
            port: DEFAULT_PORT,
            database_index,
            key_prefix: None,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Physical address of the database (`host:port/db`).
    ///
    /// Two descriptors with different names may share an address.
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database_index)
    }

    /// Connection URL understood by Redis clients.
    pub fn connection_url(&self) -> String {
        format!("redis://{}", self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_connection_url_from_parts() {
        let store = StoreDescriptor::new("service_billing", 1).with_host("10.0.0.5", 6380);
        assert_eq!(store.connection_url(), "redis://10.0.0.5:6380/1");
    }

    #[test]
    fn deserializes_with_defaults() {
        let store: StoreDescriptor =
            serde_json::from_str(r#"{"name":"horizon","database":2}"#).unwrap();
        assert_eq!(store.name.as_str(), "horizon");
        assert_eq!(store.host, "127.0.0.1");
        assert_eq!(store.port, 6379);
        assert_eq!(store.database_index, 2);
        assert!(store.key_prefix.is_none());
    }
}
