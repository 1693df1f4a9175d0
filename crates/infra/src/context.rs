//! Scoped per-call store override.
//!
//! `ScopedConnectionContext::run` resolves a tenant, binds the resolved store as
//! "current" for the duration of one operation and unbinds it on every exit path.
//!
//! ## Where the binding lives
//!
//! Bindings are kept on a per-thread stack, never in a field of the context or of
//! a repository. An invocation only ever sees bindings pushed by itself or by
//! callers further up its own stack, so:
//!
//! - concurrent invocations on different threads cannot observe each other;
//! - nested invocations (an operation that calls `run` again for another tenant)
//!   see the inner binding only inside the inner scope, and the outer binding is
//!   back in place when the inner call returns;
//! - each binding is tagged with the id of the context that pushed it, so
//!   several independent contexts can share a thread.
//!
//! Release is done by `OverrideGuard::drop`, which truncates the stack back to
//! its depth at entry. It runs on normal return, on `?`-style early return from
//! the operation, and while unwinding from a panic.
//!
//! ## Key prefix
//!
//! The prefix is bound per call instead of being set on a shared client: an
//! overridden binding carries the globally configured prefix, a fallback binding
//! carries the store's own configured prefix (or none). Store calls receive it
//! as an argument, so two concurrent calls against the same store with
//! different prefixes never interfere.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tracing::trace;

use eventhorizon_core::{JobId, StoreDescriptor, StoreName};

use crate::registry::RegisteredStore;
use crate::resolver::{ResolvedTarget, TenantConnectionResolver};
use crate::store::{JobRecord, StoreError};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static BINDINGS: RefCell<Vec<(u64, Connection)>> = const { RefCell::new(Vec::new()) };
}

/// The store an operation talks to, with the key prefix bound to this call.
#[derive(Debug, Clone)]
pub struct Connection {
    store: Arc<RegisteredStore>,
    key_prefix: Arc<str>,
    overridden: bool,
}

impl Connection {
    pub fn name(&self) -> &StoreName {
        self.store.name()
    }

    pub fn descriptor(&self) -> &StoreDescriptor {
        self.store.descriptor()
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    pub fn record_job_pushed(&self, record: &JobRecord) -> Result<(), StoreError> {
        self.store
            .client()
            .record_job_pushed(&self.key_prefix, record)
    }

    pub fn index_tags(
        &self,
        job_id: &JobId,
        tags: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.store
            .client()
            .index_tags(&self.key_prefix, job_id, tags, at)
    }

    pub fn monitored_tags(&self, tags: &BTreeSet<String>) -> Result<BTreeSet<String>, StoreError> {
        self.store.client().monitored_tags(&self.key_prefix, tags)
    }

    pub fn monitoring(&self) -> Result<BTreeSet<String>, StoreError> {
        self.store.client().monitoring(&self.key_prefix)
    }

    pub fn monitor(&self, tag: &str) -> Result<(), StoreError> {
        self.store.client().monitor(&self.key_prefix, tag)
    }

    pub fn stop_monitoring(&self, tag: &str) -> Result<(), StoreError> {
        self.store.client().stop_monitoring(&self.key_prefix, tag)
    }

    pub fn count(&self, key: &str) -> Result<u64, StoreError> {
        self.store.client().count(&self.key_prefix, key)
    }

    pub fn members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.store.client().members(&self.key_prefix, key)
    }
}

/// Pops everything pushed since entry. `!Send`: a binding never leaves its thread.
struct OverrideGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl OverrideGuard {
    fn enter(context_id: u64, connection: Connection) -> Self {
        let depth = BINDINGS.with(|b| {
            let mut stack = b.borrow_mut();
            let depth = stack.len();
            stack.push((context_id, connection));
            depth
        });
        Self {
            depth,
            _not_send: PhantomData,
        }
    }
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        // `try_with`: the thread-local may already be gone during thread teardown.
        let _ = BINDINGS.try_with(|b| b.borrow_mut().truncate(self.depth));
    }
}

#[derive(Debug)]
pub struct ScopedConnectionContext {
    id: u64,
    resolver: TenantConnectionResolver,
    prefix: Arc<str>,
}

impl ScopedConnectionContext {
    /// `prefix` is the global key prefix applied to overridden calls.
    pub fn new(resolver: TenantConnectionResolver, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            resolver,
            prefix: Arc::from(prefix),
        }
    }

    pub fn resolver(&self) -> &TenantConnectionResolver {
        &self.resolver
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Run `operation` with `tenant`'s store bound as current.
    ///
    /// Never fails on its own; whatever `operation` returns (including errors) is
    /// handed back verbatim after the binding has been released.
    pub fn run<R>(&self, tenant: Option<&str>, operation: impl FnOnce() -> R) -> R {
        let resolved = self.resolver.resolve(tenant);
        let connection = self.bind(&resolved);
        trace!(
            tenant = tenant.unwrap_or_default(),
            store = %connection.name(),
            overridden = connection.is_overridden(),
            "entering scoped connection"
        );

        let _guard = OverrideGuard::enter(self.id, connection);
        operation()
    }

    /// The store bound by the innermost enclosing `run` of this context on the
    /// current thread, or the default store outside of any `run`.
    pub fn current(&self) -> Connection {
        let bound = BINDINGS.with(|b| {
            b.borrow()
                .iter()
                .rev()
                .find(|(id, _)| *id == self.id)
                .map(|(_, connection)| connection.clone())
        });
        bound.unwrap_or_else(|| self.default_connection())
    }

    /// Whether the current thread is inside a `run` of this context.
    pub fn is_bound(&self) -> bool {
        BINDINGS.with(|b| b.borrow().iter().any(|(id, _)| *id == self.id))
    }

    fn bind(&self, resolved: &ResolvedTarget) -> Connection {
        if resolved.is_overridden() {
            Connection {
                store: Arc::clone(resolved.entry()),
                key_prefix: Arc::clone(&self.prefix),
                overridden: true,
            }
        } else {
            Self::unprefixed(Arc::clone(resolved.entry()))
        }
    }

    fn default_connection(&self) -> Connection {
        Self::unprefixed(Arc::clone(self.resolver.registry().default_entry()))
    }

    // Fallback bindings leave the prefix as the store was configured.
    fn unprefixed(store: Arc<RegisteredStore>) -> Connection {
        let key_prefix: Arc<str> = store
            .descriptor()
            .key_prefix
            .as_deref()
            .map(Arc::from)
            .unwrap_or_else(|| Arc::from(""));
        Connection {
            store,
            key_prefix,
            overridden: false,
        }
    }
}
