//! Listeners reacting to job notifications.

pub mod monitored_tags;

pub use monitored_tags::StoreMonitoredTags;
