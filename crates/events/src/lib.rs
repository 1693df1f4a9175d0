//! Job notifications and the mechanics to deliver them.

pub mod bus;
pub mod in_memory_bus;
pub mod job_pushed;
pub mod listener;
pub mod tenant;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use job_pushed::JobPushed;
pub use listener::Listener;
pub use tenant::TenantAware;
