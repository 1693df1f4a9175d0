//! Job payloads as they travel through the queue.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::error::PayloadError;
use crate::id::JobId;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Decoded {
    #[serde(default)]
    uuid: Option<JobId>,
    #[serde(default)]
    id: Option<JobId>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    job: Option<String>,
    #[serde(default)]
    max_tries: Option<u32>,
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    data: JsonValue,
}

/// A queued job's payload: the raw JSON string plus the decoded fields routing needs.
///
/// The raw string is kept verbatim so stores record exactly what was queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobPayload {
    raw: String,
    id: JobId,
    decoded: Decoded,
}

impl JobPayload {
    /// Build a payload for a new job with a generated id.
    pub fn new(display_name: impl Into<String>, tags: Vec<String>, data: JsonValue) -> Self {
        let id = JobId::generate();
        let display_name = display_name.into();
        let raw = json!({
            "uuid": id.as_str(),
            "displayName": display_name,
            "job": display_name,
            "tags": tags,
            "data": data,
        })
        .to_string();

        let decoded = Decoded {
            uuid: Some(id.clone()),
            id: None,
            display_name: Some(display_name.clone()),
            job: Some(display_name),
            max_tries: None,
            timeout: None,
            tags,
            data,
        };
        Self { raw, id, decoded }
    }

    /// Parse a queued payload. The job id is `uuid`, or `id` for payloads
    /// queued without one.
    pub fn from_json(raw: impl Into<String>) -> Result<Self, PayloadError> {
        let raw = raw.into();
        let decoded: Decoded =
            serde_json::from_str(&raw).map_err(|e| PayloadError::Malformed(e.to_string()))?;
        let id = decoded
            .uuid
            .clone()
            .or_else(|| decoded.id.clone())
            .ok_or_else(|| PayloadError::Malformed("payload has neither `uuid` nor `id`".into()))?;
        Ok(Self { raw, id, decoded })
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Display name, falling back to the job class name.
    pub fn display_name(&self) -> Option<&str> {
        self.decoded
            .display_name
            .as_deref()
            .or(self.decoded.job.as_deref())
    }

    pub fn tags(&self) -> &[String] {
        &self.decoded.tags
    }

    pub fn max_tries(&self) -> Option<u32> {
        self.decoded.max_tries
    }

    pub fn timeout(&self) -> Option<u64> {
        self.decoded.timeout
    }

    pub fn data(&self) -> &JsonValue {
        &self.decoded.data
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for JobPayload {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

impl From<JobPayload> for String {
    fn from(value: JobPayload) -> Self {
        value.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_queued_payload() {
        let raw = json!({
            "uuid": "billing-job-uuid",
            "displayName": "BillingJob",
            "job": "BillingJob",
            "maxTries": 3,
            "timeout": 60,
            "tags": ["billing", "payment"],
            "data": {"test": "billing-data"}
        })
        .to_string();

        let payload = JobPayload::from_json(raw.clone()).unwrap();
        assert_eq!(payload.id().as_str(), "billing-job-uuid");
        assert_eq!(payload.display_name(), Some("BillingJob"));
        assert_eq!(payload.tags(), ["billing", "payment"]);
        assert_eq!(payload.max_tries(), Some(3));
        assert_eq!(payload.raw(), raw);
    }

    #[test]
    fn missing_tags_decode_as_empty() {
        let payload = JobPayload::from_json(r#"{"uuid":"no-tags","job":"NoTagsJob"}"#).unwrap();
        assert!(payload.tags().is_empty());
        assert_eq!(payload.display_name(), Some("NoTagsJob"));
    }

    #[test]
    fn rejects_payload_without_uuid() {
        let err = JobPayload::from_json(r#"{"displayName":"Broken"}"#).unwrap_err();
        assert!(matches!(err, PayloadError::Malformed(_)));
    }

    #[test]
    fn falls_back_to_id_when_uuid_is_absent() {
        let payload = JobPayload::from_json(r#"{"id":"legacy-job","job":"LegacyJob"}"#).unwrap();
        assert_eq!(payload.id().as_str(), "legacy-job");

        let both = JobPayload::from_json(r#"{"uuid":"primary","id":"secondary"}"#).unwrap();
        assert_eq!(both.id().as_str(), "primary");
    }

    #[test]
    fn generated_payload_is_decodable() {
        let payload = JobPayload::new("ReportJob", vec!["reports".into()], json!({"n": 1}));
        let reparsed = JobPayload::from_json(payload.raw()).unwrap();
        assert_eq!(reparsed.id(), payload.id());
        assert_eq!(reparsed.tags(), ["reports"]);
        assert_eq!(reparsed.display_name(), Some("ReportJob"));
        assert_eq!(reparsed.data(), &json!({"n": 1}));
        assert!(!payload.raw().is_empty());
    }
}
