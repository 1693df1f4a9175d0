use serde::{Deserialize, Serialize};

use crate::id::{StoreName, TenantName};

/// Declares which backend store a tenant's operations target.
///
/// Mappings are not required to be exhaustive, and `backend_store_name` is not
/// checked against the registry here: a dangling name is a valid mapping that
/// simply resolves to the default store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMapping {
    pub tenant: TenantName,
    #[serde(alias = "connection")]
    pub backend_store_name: StoreName,
}

impl TenantMapping {
    pub fn new(tenant: impl Into<TenantName>, backend_store_name: impl Into<StoreName>) -> Self {
        Self {
            tenant: tenant.into(),
            backend_store_name: backend_store_name.into(),
        }
    }
}
