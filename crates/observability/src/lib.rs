//! Process-wide tracing/logging setup.

/// Initialize tracing for the process with the `info` default filter.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init() {
    tracing::init();
}

/// Subscriber construction and filter resolution.
pub mod tracing;
