use std::collections::BTreeSet;

use tracing::trace;

use eventhorizon_events::{JobPushed, Listener};

use crate::repositories::TagRepository;
use crate::store::StoreError;

/// Indexes a pushed job under those of its tags that are monitored, in the
/// store resolved for the tenant the job was pushed under.
#[derive(Debug, Clone)]
pub struct StoreMonitoredTags<T> {
    tags: T,
}

impl<T> StoreMonitoredTags<T>
where
    T: TagRepository,
{
    pub fn new(tags: T) -> Self {
        Self { tags }
    }

    pub fn repository(&self) -> &T {
        &self.tags
    }
}

impl<T> Listener<JobPushed> for StoreMonitoredTags<T>
where
    T: TagRepository,
{
    type Error = StoreError;

    fn handle(&self, event: &JobPushed) -> Result<(), Self::Error> {
        if event.tags().is_empty() {
            trace!(job_id = %event.job_id(), "job has no tags");
            return Ok(());
        }

        let tenant = event.connection_name.as_ref().map(|t| t.as_str());
        let tags: BTreeSet<String> = event.tags().iter().cloned().collect();

        let monitored = self.tags.monitored(&tags, tenant)?;
        if monitored.is_empty() {
            trace!(job_id = %event.job_id(), "no monitored tags");
            return Ok(());
        }

        self.tags.add(event.job_id(), &monitored, tenant)
    }
}
