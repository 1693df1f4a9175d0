//! Background workers that drive listeners from a notification bus.

pub mod listener_worker;

pub use listener_worker::{ListenerWorker, WorkerHandle};
