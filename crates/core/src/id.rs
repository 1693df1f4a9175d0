//! Strongly-typed identifiers used across the routing layer.

use core::borrow::Borrow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of a tenant ("queue connection") whose jobs may live in their own store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantName(String);

/// Name of a registered backend store (one host/database pair).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreName(String);

/// Identifier of a pushed job, as carried in its payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

macro_rules! impl_string_newtype {
    ($t:ty) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        // Lets `HashMap<$t, _>` be queried with a plain `&str`.
        impl Borrow<str> for $t {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_newtype!(TenantName);
impl_string_newtype!(StoreName);
impl_string_newtype!(JobId);

impl JobId {
    /// Generate a fresh, time-ordered job identifier (UUIDv7).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

/// Name of the always-present fallback store.
pub const DEFAULT_STORE_NAME: &str = "horizon";

impl StoreName {
    pub fn horizon() -> Self {
        Self::new(DEFAULT_STORE_NAME)
    }
}
