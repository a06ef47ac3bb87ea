use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::ApiClientError;

/// Result of posting an archive to the upload endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The service answered 200 with this body.
    Uploaded(Value),
    /// The service answered with a non-200 status.
    Rejected(StatusCode),
}

impl UploadOutcome {
    pub const fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded(_))
    }

    /// # Errors
    ///
    /// Returns [`ApiClientError::UploadRejected`] for a rejected upload.
    pub fn into_result(self) -> Result<Value, ApiClientError> {
        match self {
            Self::Uploaded(body) => Ok(body),
            Self::Rejected(status) => Err(ApiClientError::UploadRejected(status)),
        }
    }
}

/// Payload of a `job-status` push event.
///
/// Carries at least `error` and `percent`. Either may arrive as a
/// number, a boolean or a numeric string, so the raw object is kept and
/// the fields are read leniently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobStatus(Value);

impl JobStatus {
    pub const fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn error(&self) -> bool {
        match self.0.get("error") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => s.trim().parse::<f64>().is_ok_and(|n| n != 0.0),
            _ => false,
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match self.0.get("percent")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent().is_some_and(|p| p >= 100.0)
    }

    /// Whether the service will send nothing further for this job.
    pub fn is_terminal(&self) -> bool {
        self.error() || self.is_complete()
    }

    pub const fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// How a job status subscription ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenOutcome {
    /// The job reached 100 percent.
    Completed(JobStatus),
    /// The service reported an error for the job.
    Failed(JobStatus),
    /// The callback asked to stop listening.
    Cancelled,
}

impl ListenOutcome {
    pub const fn last_status(&self) -> Option<&JobStatus> {
        match self {
            Self::Completed(status) | Self::Failed(status) => Some(status),
            Self::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_fields() {
        let status = JobStatus::new(json!({"error": 0, "percent": 50}));
        assert!(!status.error());
        assert_eq!(status.percent(), Some(50.0));
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_complete_is_terminal() {
        let status = JobStatus::new(json!({"error": 0, "percent": 100}));
        assert!(status.is_complete());
        assert!(status.is_terminal());
    }

    #[test]
    fn test_error_flag_forms() {
        assert!(JobStatus::new(json!({"error": 1, "percent": 10})).error());
        assert!(JobStatus::new(json!({"error": true})).error());
        assert!(JobStatus::new(json!({"error": "1"})).error());
        assert!(!JobStatus::new(json!({"error": "0"})).error());
        assert!(!JobStatus::new(json!({"percent": 10})).error());
    }

    #[test]
    fn test_percent_as_string() {
        let status = JobStatus::new(json!({"error": 0, "percent": "100"}));
        assert_eq!(status.percent(), Some(100.0));
        assert!(status.is_terminal());
    }

    #[test]
    fn test_missing_percent() {
        let status = JobStatus::new(json!({"error": 0, "message": "queued"}));
        assert_eq!(status.percent(), None);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_upload_outcome_into_result() {
        let ok = UploadOutcome::Uploaded(json!({"status": "ok"}));
        assert!(ok.is_uploaded());
        assert_eq!(ok.into_result().unwrap(), json!({"status": "ok"}));

        let rejected = UploadOutcome::Rejected(StatusCode::UNPROCESSABLE_ENTITY);
        let err = rejected.into_result().unwrap_err();
        assert_eq!(err.error_code(), "E006");
    }

    #[test]
    fn test_listen_outcome_last_status() {
        let status = JobStatus::new(json!({"error": 0, "percent": 100}));
        let outcome = ListenOutcome::Completed(status.clone());
        assert_eq!(outcome.last_status(), Some(&status));
        assert_eq!(ListenOutcome::Cancelled.last_status(), None);
    }
}
