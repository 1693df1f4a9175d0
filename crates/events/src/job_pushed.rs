use serde::{Deserialize, Serialize};

use eventhorizon_core::{JobId, JobPayload, TenantName};

/// Raised after a job has been placed on a queue.
///
/// `connection_name` is the tenant the job was pushed under; `None` means the
/// job was pushed without one and is recorded in the default store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPushed {
    pub payload: JobPayload,
    pub connection_name: Option<TenantName>,
    pub queue: Option<String>,
}

impl JobPushed {
    pub fn new(payload: JobPayload) -> Self {
        Self {
            payload,
            connection_name: None,
            queue: None,
        }
    }

    pub fn connection(mut self, name: impl Into<TenantName>) -> Self {
        self.connection_name = Some(name.into());
        self
    }

    pub fn queue(mut self, name: impl Into<String>) -> Self {
        self.queue = Some(name.into());
        self
    }

    pub fn job_id(&self) -> &JobId {
        self.payload.id()
    }

    pub fn tags(&self) -> &[String] {
        self.payload.tags()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_sets_connection_and_queue() {
        let payload = JobPayload::new("BillingJob", vec!["billing".into()], json!({}));
        let event = JobPushed::new(payload.clone())
            .connection("billing_service")
            .queue("default");

        assert_eq!(event.connection_name, Some(TenantName::new("billing_service")));
        assert_eq!(event.queue.as_deref(), Some("default"));
        assert_eq!(event.job_id(), payload.id());
        assert_eq!(event.tags(), ["billing"]);
    }

    #[test]
    fn travels_as_json_with_raw_payload() {
        let payload = JobPayload::from_json(r#"{"uuid":"abc","tags":["a"]}"#).unwrap();
        let event = JobPushed::new(payload).connection("auth_service");

        let wire = serde_json::to_string(&event).unwrap();
        let back: JobPushed = serde_json::from_str(&wire).unwrap();

        assert_eq!(back, event);
        assert_eq!(back.payload.raw(), r#"{"uuid":"abc","tags":["a"]}"#);
    }
}
