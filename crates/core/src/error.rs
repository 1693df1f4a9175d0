//! Error model for configuration, registry lookups and payload decoding.
//!
//! Backend failures (connectivity, IO) are not modeled here; they belong to the
//! store adapters in `eventhorizon-infra` and flow through routing untouched.

use thiserror::Error;

use crate::id::{StoreName, TenantName};

/// Startup-time misconfiguration. Always fatal, never raised at call time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The fallback store is not among the configured stores.
    #[error("default store `{0}` is not configured")]
    MissingDefaultStore(StoreName),

    /// Two stores were configured under the same name.
    #[error("store `{0}` is configured more than once")]
    DuplicateStore(StoreName),

    /// Two mappings were configured for the same tenant.
    #[error("tenant `{0}` is mapped more than once")]
    DuplicateTenant(TenantName),

    /// A field carried a value that cannot be used.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// The configuration document could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),

    /// The configuration document could not be read.
    #[error("config read failed: {0}")]
    Io(String),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Lookup failure against the store registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown store `{0}`")]
    UnknownStore(StoreName),
}

/// A job payload could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("malformed job payload: {0}")]
    Malformed(String),
}
