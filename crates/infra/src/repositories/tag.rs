use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::field::Empty;
use tracing::instrument;

use eventhorizon_core::JobId;

use crate::context::ScopedConnectionContext;
use crate::repositories::current;
use crate::store::StoreError;

pub trait TagRepository: Send + Sync {
    /// The subset of `tags` that is monitored.
    fn monitored(
        &self,
        tags: &BTreeSet<String>,
        tenant: Option<&str>,
    ) -> Result<BTreeSet<String>, StoreError>;

    /// Index `job_id` under each of `tags`.
    fn add(
        &self,
        job_id: &JobId,
        tags: &BTreeSet<String>,
        tenant: Option<&str>,
    ) -> Result<(), StoreError>;

    fn monitoring(&self, tenant: Option<&str>) -> Result<BTreeSet<String>, StoreError>;

    fn monitor(&self, tag: &str, tenant: Option<&str>) -> Result<(), StoreError>;

    fn stop_monitoring(&self, tag: &str, tenant: Option<&str>) -> Result<(), StoreError>;

    /// Number of jobs indexed under `tag`.
    fn count(&self, tag: &str, tenant: Option<&str>) -> Result<u64, StoreError>;

    /// Ids of jobs indexed under `tag`, oldest first.
    fn jobs(&self, tag: &str, tenant: Option<&str>) -> Result<Vec<String>, StoreError>;
}

impl<R> TagRepository for Arc<R>
where
    R: TagRepository + ?Sized,
{
    fn monitored(
        &self,
        tags: &BTreeSet<String>,
        tenant: Option<&str>,
    ) -> Result<BTreeSet<String>, StoreError> {
        (**self).monitored(tags, tenant)
    }

    fn add(
        &self,
        job_id: &JobId,
        tags: &BTreeSet<String>,
        tenant: Option<&str>,
    ) -> Result<(), StoreError> {
        (**self).add(job_id, tags, tenant)
    }

    fn monitoring(&self, tenant: Option<&str>) -> Result<BTreeSet<String>, StoreError> {
        (**self).monitoring(tenant)
    }

    fn monitor(&self, tag: &str, tenant: Option<&str>) -> Result<(), StoreError> {
        (**self).monitor(tag, tenant)
    }

    fn stop_monitoring(&self, tag: &str, tenant: Option<&str>) -> Result<(), StoreError> {
        (**self).stop_monitoring(tag, tenant)
    }

    fn count(&self, tag: &str, tenant: Option<&str>) -> Result<u64, StoreError> {
        (**self).count(tag, tenant)
    }

    fn jobs(&self, tag: &str, tenant: Option<&str>) -> Result<Vec<String>, StoreError> {
        (**self).jobs(tag, tenant)
    }
}

#[derive(Debug, Clone)]
pub struct RoutedTagRepository {
    context: Arc<ScopedConnectionContext>,
}

impl RoutedTagRepository {
    pub fn new(context: Arc<ScopedConnectionContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<ScopedConnectionContext> {
        &self.context
    }
}

impl TagRepository for RoutedTagRepository {
    #[instrument(
        skip(self, tags, tenant),
        fields(tenant = tenant.unwrap_or_default(), store = Empty, tags = tags.len())
    )]
    fn monitored(
        &self,
        tags: &BTreeSet<String>,
        tenant: Option<&str>,
    ) -> Result<BTreeSet<String>, StoreError> {
        // Monitoring is tenant-independent, but the lookup still runs under the
        // tenant's binding like every other tag operation.
        self.context.run(tenant, || {
            let connection = current(&self.context);
            if tags.is_empty() {
                return Ok(BTreeSet::new());
            }
            connection.monitored_tags(tags)
        })
    }

    #[instrument(
        skip(self, tags, tenant),
        fields(
            tenant = tenant.unwrap_or_default(),
            store = Empty,
            job_id = %job_id,
            tags = tags.len()
        )
    )]
    fn add(
        &self,
        job_id: &JobId,
        tags: &BTreeSet<String>,
        tenant: Option<&str>,
    ) -> Result<(), StoreError> {
        self.context.run(tenant, || current(&self.context).index_tags(job_id, tags, Utc::now()))
    }

    #[instrument(skip(self, tenant), fields(tenant = tenant.unwrap_or_default(), store = Empty))]
    fn monitoring(&self, tenant: Option<&str>) -> Result<BTreeSet<String>, StoreError> {
        self.context.run(tenant, || current(&self.context).monitoring())
    }

    #[instrument(skip(self, tenant), fields(tenant = tenant.unwrap_or_default(), store = Empty))]
    fn monitor(&self, tag: &str, tenant: Option<&str>) -> Result<(), StoreError> {
        self.context.run(tenant, || current(&self.context).monitor(tag))
    }

    #[instrument(skip(self, tenant), fields(tenant = tenant.unwrap_or_default(), store = Empty))]
    fn stop_monitoring(&self, tag: &str, tenant: Option<&str>) -> Result<(), StoreError> {
        self.context.run(tenant, || current(&self.context).stop_monitoring(tag))
    }

    #[instrument(skip(self, tenant), fields(tenant = tenant.unwrap_or_default(), store = Empty))]
    fn count(&self, tag: &str, tenant: Option<&str>) -> Result<u64, StoreError> {
        self.context.run(tenant, || current(&self.context).count(tag))
    }

    #[instrument(skip(self, tenant), fields(tenant = tenant.unwrap_or_default(), store = Empty))]
    fn jobs(&self, tag: &str, tenant: Option<&str>) -> Result<Vec<String>, StoreError> {
        self.context.run(tenant, || current(&self.context).members(tag))
    }
}
