//! In-memory store for tests/dev.
//!
//! Mirrors the Redis data layout (sorted sets, hashes, sets) closely enough that
//! tests can assert on the same keys a dashboard would read.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use eventhorizon_core::JobId;

use super::{
    JobRecord, MONITORING_KEY, PENDING_JOBS_KEY, RECENT_JOBS_KEY, Store, StoreError, prefixed,
};

#[derive(Debug, Default)]
struct Keyspace {
    sorted_sets: HashMap<String, HashMap<String, f64>>,
    hashes: HashMap<String, BTreeMap<String, String>>,
    sets: HashMap<String, BTreeSet<String>>,
    expirations: HashMap<String, DateTime<Utc>>,
}

impl Keyspace {
    fn zadd(&mut self, key: String, member: &str, score: f64) {
        self.sorted_sets
            .entry(key)
            .or_default()
            .insert(member.to_owned(), score);
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Keyspace>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Make every subsequent call fail with a connection error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every key currently held, fully prefixed, sorted.
    pub fn keys(&self) -> Vec<String> {
        let Ok(space) = self.inner.read() else {
            return vec![];
        };
        let mut keys: Vec<String> = space
            .sorted_sets
            .keys()
            .chain(space.hashes.keys())
            .chain(space.sets.keys())
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// A stored hash by its fully prefixed key.
    pub fn hash(&self, key: &str) -> Option<BTreeMap<String, String>> {
        self.inner.read().ok()?.hashes.get(key).cloned()
    }

    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.inner.read().ok()?.expirations.get(key).copied()
    }

    /// Drop every key (FLUSHDB).
    pub fn flush(&self) {
        if let Ok(mut space) = self.inner.write() {
            *space = Keyspace::default();
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("store unavailable".to_string()));
        }
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Keyspace) -> T) -> Result<T, StoreError> {
        self.check_available()?;
        let space = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&space))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Keyspace) -> T) -> Result<T, StoreError> {
        self.check_available()?;
        let mut space = self.inner.write().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&mut space))
    }
}

impl Store for InMemoryStore {
    fn record_job_pushed(&self, prefix: &str, record: &JobRecord) -> Result<(), StoreError> {
        let id = record.id.as_str();
        let score = record.recency_score();
        self.write(|space| {
            space.zadd(prefixed(prefix, RECENT_JOBS_KEY), id, score);
            space.zadd(prefixed(prefix, PENDING_JOBS_KEY), id, score);

            let key = prefixed(prefix, id);
            let hash = space.hashes.entry(key.clone()).or_default();
            for (field, value) in record.fields() {
                hash.insert(field.to_string(), value);
            }
            space.expirations.insert(key, record.expires_at);
        })
    }

    fn index_tags(
        &self,
        prefix: &str,
        job_id: &JobId,
        tags: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let score = at.timestamp_micros() as f64 / 1_000_000.0;
        self.write(|space| {
            for tag in tags {
                space.zadd(prefixed(prefix, tag), job_id.as_str(), score);
            }
        })
    }

    fn monitoring(&self, prefix: &str) -> Result<BTreeSet<String>, StoreError> {
        self.read(|space| {
            space
                .sets
                .get(&prefixed(prefix, MONITORING_KEY))
                .cloned()
                .unwrap_or_default()
        })
    }

    fn monitor(&self, prefix: &str, tag: &str) -> Result<(), StoreError> {
        self.write(|space| {
            space
                .sets
                .entry(prefixed(prefix, MONITORING_KEY))
                .or_default()
                .insert(tag.to_owned());
        })
    }

    fn stop_monitoring(&self, prefix: &str, tag: &str) -> Result<(), StoreError> {
        self.write(|space| {
            let key = prefixed(prefix, MONITORING_KEY);
            if let Some(set) = space.sets.get_mut(&key) {
                set.remove(tag);
                if set.is_empty() {
                    space.sets.remove(&key);
                }
            }
        })
    }

    fn count(&self, prefix: &str, key: &str) -> Result<u64, StoreError> {
        self.read(|space| {
            space
                .sorted_sets
                .get(&prefixed(prefix, key))
                .map_or(0, |set| set.len() as u64)
        })
    }

    fn members(&self, prefix: &str, key: &str) -> Result<Vec<String>, StoreError> {
        self.read(|space| {
            let Some(set) = space.sorted_sets.get(&prefixed(prefix, key)) else {
                return vec![];
            };
            let mut scored: Vec<(&String, f64)> = set.iter().map(|(m, s)| (m, *s)).collect();
            scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            scored.into_iter().map(|(m, _)| m.clone()).collect()
        })
    }
}
