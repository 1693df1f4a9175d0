//! Redis-backed store (optional, `redis` feature).
//!
//! One `RedisStore` per configured host/database pair. The bound key prefix is
//! applied to every key on each call; the client itself carries no prefix.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use eventhorizon_core::{JobId, StoreDescriptor};

use super::{
    JobRecord, MONITORING_KEY, PENDING_JOBS_KEY, RECENT_JOBS_KEY, Store, StoreError, prefixed,
};

#[derive(Debug, Clone)]
pub struct RedisStore {
    client: Arc<redis::Client>,
    address: String,
}

impl RedisStore {
    /// Open a client for the descriptor's host/database. No connection is made yet.
    pub fn open(descriptor: &StoreDescriptor) -> Result<Self, StoreError> {
        let client = redis::Client::open(descriptor.connection_url())
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            address: descriptor.address(),
        })
    }

    fn connection(&self) -> Result<redis::Connection, StoreError> {
        self.client
            .get_connection()
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

fn command_error(e: redis::RedisError) -> StoreError {
    StoreError::Command(e.to_string())
}

impl Store for RedisStore {
    #[instrument(skip(self, record), fields(address = %self.address, job_id = %record.id))]
    fn record_job_pushed(&self, prefix: &str, record: &JobRecord) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        let id = record.id.as_str();
        let score = record.recency_score();
        let job_key = prefixed(prefix, id);

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.cmd("ZADD")
            .arg(prefixed(prefix, RECENT_JOBS_KEY))
            .arg(score)
            .arg(id)
            .ignore();
        pipe.cmd("ZADD")
            .arg(prefixed(prefix, PENDING_JOBS_KEY))
            .arg(score)
            .arg(id)
            .ignore();

        pipe.cmd("HSET").arg(&job_key);
        for (field, value) in record.fields() {
            pipe.arg(field).arg(value);
        }
        pipe.ignore();

        pipe.cmd("EXPIREAT")
            .arg(&job_key)
            .arg(record.expires_at.timestamp())
            .ignore();

        pipe.query::<()>(&mut conn).map_err(command_error)
    }

    #[instrument(skip(self, tags), fields(address = %self.address, job_id = %job_id))]
    fn index_tags(
        &self,
        prefix: &str,
        job_id: &JobId,
        tags: &BTreeSet<String>,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if tags.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection()?;
        let score = at.timestamp_micros() as f64 / 1_000_000.0;

        let mut pipe = redis::pipe();
        for tag in tags {
            pipe.cmd("ZADD")
                .arg(prefixed(prefix, tag))
                .arg(score)
                .arg(job_id.as_str())
                .ignore();
        }

        pipe.query::<()>(&mut conn).map_err(command_error)
    }

    fn monitoring(&self, prefix: &str) -> Result<BTreeSet<String>, StoreError> {
        let mut conn = self.connection()?;
        let members: Vec<String> = redis::cmd("SMEMBERS")
            .arg(prefixed(prefix, MONITORING_KEY))
            .query(&mut conn)
            .map_err(command_error)?;
        Ok(members.into_iter().collect())
    }

    fn monitor(&self, prefix: &str, tag: &str) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        redis::cmd("SADD")
            .arg(prefixed(prefix, MONITORING_KEY))
            .arg(tag)
            .query::<()>(&mut conn)
            .map_err(command_error)
    }

    fn stop_monitoring(&self, prefix: &str, tag: &str) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        redis::cmd("SREM")
            .arg(prefixed(prefix, MONITORING_KEY))
            .arg(tag)
            .query::<()>(&mut conn)
            .map_err(command_error)
    }

    fn count(&self, prefix: &str, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection()?;
        redis::cmd("ZCARD")
            .arg(prefixed(prefix, key))
            .query(&mut conn)
            .map_err(command_error)
    }

    fn members(&self, prefix: &str, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection()?;
        redis::cmd("ZRANGE")
            .arg(prefixed(prefix, key))
            .arg(0)
            .arg(-1)
            .query(&mut conn)
            .map_err(command_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_does_not_connect() {
        let descriptor = StoreDescriptor::new("service_billing", 1).with_host("127.0.0.1", 1);
        let store = RedisStore::open(&descriptor).unwrap();
        assert_eq!(store.address, "127.0.0.1:1/1");
    }
}
