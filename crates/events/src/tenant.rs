use eventhorizon_core::TenantName;

use crate::JobPushed;

/// Marks messages that carry the tenant they were raised under.
///
/// Infrastructure uses this for log correlation; routing itself always goes
/// through the resolver, which accepts an absent tenant.
pub trait TenantAware {
    fn tenant(&self) -> Option<&TenantName>;
}

impl TenantAware for JobPushed {
    fn tenant(&self) -> Option<&TenantName> {
        self.connection_name.as_ref()
    }
}
