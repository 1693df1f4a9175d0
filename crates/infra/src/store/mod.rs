//! The key-value `Store` capability that repositories write through.
//!
//! Every call receives the key prefix bound to it by the scoped connection
//! context; implementations must namespace *all* keys with it and must not
//! keep it as client state.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use eventhorizon_core::{JobId, JobPayload, TenantName};

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use in_memory::InMemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// Sorted set of the most recently pushed jobs.
pub const RECENT_JOBS_KEY: &str = "recent_jobs";
/// Sorted set of jobs that have been pushed but not yet reserved.
pub const PENDING_JOBS_KEY: &str = "pending_jobs";
/// Set of tag names worth indexing.
pub const MONITORING_KEY: &str = "monitoring";

/// Backend failure. Routing never wraps or inspects these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),
    #[error("store command error: {0}")]
    Command(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("store state poisoned")]
    Poisoned,
}

/// Apply a bound prefix to a logical key.
pub fn prefixed(prefix: &str, key: &str) -> String {
    let mut full = String::with_capacity(prefix.len() + key.len());
    full.push_str(prefix);
    full.push_str(key);
    full
}

/// The hash written for a freshly pushed job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    pub connection: Option<TenantName>,
    pub queue: String,
    pub name: Option<String>,
    pub payload: String,
    pub pushed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn pending(
        connection: Option<TenantName>,
        queue: impl Into<String>,
        payload: &JobPayload,
        pushed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: payload.id().clone(),
            connection,
            queue: queue.into(),
            name: payload.display_name().map(str::to_owned),
            payload: payload.raw().to_owned(),
            pushed_at,
            expires_at,
        }
    }

    /// Fractional unix seconds of the push.
    pub fn pushed_at_secs(&self) -> f64 {
        self.pushed_at.timestamp_micros() as f64 / 1_000_000.0
    }

    /// Score used in the recency sets; newest sorts first.
    pub fn recency_score(&self) -> f64 {
        -self.pushed_at_secs()
    }

    /// Field/value pairs of the job hash.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let time = format!("{:.4}", self.pushed_at_secs());
        vec![
            ("id", self.id.to_string()),
            (
                "connection",
                self.connection
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ),
            ("queue", self.queue.clone()),
            ("name", self.name.clone().unwrap_or_default()),
            ("status", "pending".to_string()),
            ("payload", self.payload.clone()),
            ("created_at", time.clone()),
            ("updated_at", time),
        ]
    }
}

/// One physical key-value backend.
pub trait Store: Send + Sync + core::fmt::Debug {
    /// Record a job as pushed: recency/pending references plus the job hash.
    fn record_job_pushed(&self, prefix: &str, record: &JobRecord) -> Result<(), StoreError>;

    /// Add `job_id` to the index of every tag in `tags`.
    fn index_tags(
        &self,
        prefix: &str,
        job_id: &JobId,
        tags: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// All currently monitored tags.
    fn monitoring(&self, prefix: &str) -> Result<BTreeSet<String>, StoreError>;

    fn monitor(&self, prefix: &str, tag: &str) -> Result<(), StoreError>;

    fn stop_monitoring(&self, prefix: &str, tag: &str) -> Result<(), StoreError>;

    /// Cardinality of a sorted set.
    fn count(&self, prefix: &str, key: &str) -> Result<u64, StoreError>;

    /// Members of a sorted set, lowest score first.
    fn members(&self, prefix: &str, key: &str) -> Result<Vec<String>, StoreError>;

    /// The subset of `tags` that is monitored.
    fn monitored_tags(
        &self,
        prefix: &str,
        tags: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StoreError> {
        let monitoring = self.monitoring(prefix)?;
        Ok(tags.intersection(&monitoring).cloned().collect())
    }
}

impl<S> Store for Arc<S>
where
    S: Store + ?Sized,
{
    fn record_job_pushed(&self, prefix: &str, record: &JobRecord) -> Result<(), StoreError> {
        (**self).record_job_pushed(prefix, record)
    }

    fn index_tags(
        &self,
        prefix: &str,
        job_id: &JobId,
        tags: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        (**self).index_tags(prefix, job_id, tags, at)
    }

    fn monitoring(&self, prefix: &str) -> Result<BTreeSet<String>, StoreError> {
        (**self).monitoring(prefix)
    }

    fn monitor(&self, prefix: &str, tag: &str) -> Result<(), StoreError> {
        (**self).monitor(prefix, tag)
    }

    fn stop_monitoring(&self, prefix: &str, tag: &str) -> Result<(), StoreError> {
        (**self).stop_monitoring(prefix, tag)
    }

    fn count(&self, prefix: &str, key: &str) -> Result<u64, StoreError> {
        (**self).count(prefix, key)
    }

    fn members(&self, prefix: &str, key: &str) -> Result<Vec<String>, StoreError> {
        (**self).members(prefix, key)
    }

    fn monitored_tags(
        &self,
        prefix: &str,
        tags: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, StoreError> {
        (**self).monitored_tags(prefix, tags)
    }
}
