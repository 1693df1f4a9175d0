use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::field::Empty;
use tracing::instrument;

use eventhorizon_core::{JobPayload, TenantName};

use crate::context::ScopedConnectionContext;
use crate::repositories::current;
use crate::store::{JobRecord, PENDING_JOBS_KEY, RECENT_JOBS_KEY, StoreError};

/// Default lifetime of a pending job record, in minutes.
pub const DEFAULT_PENDING_MINUTES: u32 = 60;

pub trait JobRepository: Send + Sync {
    /// Record a job as pushed onto `queue` in the store resolved for `tenant`.
    fn pushed(
        &self,
        tenant: Option<&str>,
        queue: &str,
        payload: &JobPayload,
    ) -> Result<(), StoreError>;

    fn count_recent(&self, tenant: Option<&str>) -> Result<u64, StoreError>;

    fn count_pending(&self, tenant: Option<&str>) -> Result<u64, StoreError>;
}

impl<R> JobRepository for Arc<R>
where
    R: JobRepository + ?Sized,
{
    fn pushed(
        &self,
        tenant: Option<&str>,
        queue: &str,
        payload: &JobPayload,
    ) -> Result<(), StoreError> {
        (**self).pushed(tenant, queue, payload)
    }

    fn count_recent(&self, tenant: Option<&str>) -> Result<u64, StoreError> {
        (**self).count_recent(tenant)
    }

    fn count_pending(&self, tenant: Option<&str>) -> Result<u64, StoreError> {
        (**self).count_pending(tenant)
    }
}

#[derive(Debug, Clone)]
pub struct RoutedJobRepository {
    context: Arc<ScopedConnectionContext>,
    pending_expiry: Duration,
}

impl RoutedJobRepository {
    pub fn new(context: Arc<ScopedConnectionContext>) -> Self {
        Self::with_pending_minutes(context, DEFAULT_PENDING_MINUTES)
    }

    pub fn with_pending_minutes(context: Arc<ScopedConnectionContext>, minutes: u32) -> Self {
        Self {
            context,
            pending_expiry: Duration::minutes(i64::from(minutes)),
        }
    }

    pub fn context(&self) -> &Arc<ScopedConnectionContext> {
        &self.context
    }
}

impl JobRepository for RoutedJobRepository {
    #[instrument(
        skip(self, tenant, payload),
        fields(tenant = tenant.unwrap_or_default(), store = Empty, job_id = %payload.id())
    )]
    fn pushed(
        &self,
        tenant: Option<&str>,
        queue: &str,
        payload: &JobPayload,
    ) -> Result<(), StoreError> {
        self.context.run(tenant, || {
            let connection = current(&self.context);
            let now = Utc::now();
            let record = JobRecord::pending(
                tenant.map(TenantName::from),
                queue,
                payload,
                now,
                now + self.pending_expiry,
            );
            connection.record_job_pushed(&record)
        })
    }

    #[instrument(skip(self, tenant), fields(tenant = tenant.unwrap_or_default(), store = Empty))]
    fn count_recent(&self, tenant: Option<&str>) -> Result<u64, StoreError> {
        self.context.run(tenant, || current(&self.context).count(RECENT_JOBS_KEY))
    }

    #[instrument(skip(self, tenant), fields(tenant = tenant.unwrap_or_default(), store = Empty))]
    fn count_pending(&self, tenant: Option<&str>) -> Result<u64, StoreError> {
        self.context.run(tenant, || current(&self.context).count(PENDING_JOBS_KEY))
    }
}
