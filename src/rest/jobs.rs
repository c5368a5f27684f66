//! Asynchronous jobs.
//!
//! Long-running operations (bulk destroys, some creates) answer `202
//! Accepted` with a job document instead of a result:
//!
//! ```json
//! {"data": {"type": "job", "id": "4235"}}
//! ```
//!
//! The outcome is published at `job-results/{id}` once the job finishes.
//! [`RestClient::wait_for_job`] polls that endpoint with a growing interval
//! until the job succeeds, fails or runs out of time.
//!
//! ```rust,ignore
//! let job = client.uploads().bulk_destroy(&["1", "2"]).await?;
//! let result = client.wait_for_job(&job).await?;
//! ```

use std::time::{Duration, Instant};

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clients::{sleep_or_cancel, HttpError, HttpMethod, RestClient, RestError};
use crate::config::JobPollPolicy;
use crate::rest::path::build_path;
use crate::rest::ResourceError;

const JOB_RESULT_PATH: &str = "job-results/{id}";

/// A reference to a running job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle {
    /// The job id.
    pub id: String,
}

impl JobHandle {
    /// Creates a handle for a known job id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Extracts a handle from a `202` body of type `job`.
    #[must_use]
    pub fn from_body(body: &Value) -> Option<Self> {
        let data = body.get("data")?;
        if data.get("type").and_then(Value::as_str) != Some("job") {
            return None;
        }
        match data.get("id")? {
            Value::String(id) => Some(Self::new(id.clone())),
            Value::Number(id) => Some(Self::new(id.to_string())),
            _ => None,
        }
    }
}

/// State of a job as reported by its result endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Still queued or running.
    Pending,
    /// Finished; holds the job's result payload.
    Success(Value),
    /// Finished unsuccessfully.
    Failed {
        /// The reported reason.
        reason: String,
        /// The full result document.
        payload: Value,
    },
}

impl JobStatus {
    /// Parses a job result body.
    ///
    /// Accepts a JSON:API document (`data.attributes.status`) or a flat
    /// `{status, result, error}` object. `status` is either a word
    /// (`pending`, `queued`, `running`, `success`, `completed`, `failed`,
    /// `error`) or the HTTP status of the finished operation, with its
    /// response under `payload`.
    #[must_use]
    pub fn from_body(body: &Value) -> Self {
        let attributes = body.pointer("/data/attributes").unwrap_or(body);

        match attributes.get("status") {
            Some(Value::String(status)) => match status.to_ascii_lowercase().as_str() {
                "pending" | "queued" | "running" => Self::Pending,
                "success" | "completed" => Self::Success(result_of(attributes)),
                "failed" | "error" => Self::Failed {
                    reason: failure_reason(attributes),
                    payload: body.clone(),
                },
                other => Self::Failed {
                    reason: format!("unknown job status `{other}`"),
                    payload: body.clone(),
                },
            },
            Some(Value::Number(code)) => match code.as_u64() {
                Some(200..=299) => Self::Success(result_of(attributes)),
                _ => Self::Failed {
                    reason: failure_reason(attributes),
                    payload: body.clone(),
                },
            },
            _ => Self::Pending,
        }
    }

    /// Returns `true` for `Success` and `Failed`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

fn result_of(attributes: &Value) -> Value {
    attributes
        .get("result")
        .or_else(|| attributes.get("payload"))
        .cloned()
        .unwrap_or(Value::Null)
}

fn failure_reason(attributes: &Value) -> String {
    let explicit = match attributes.get("error") {
        Some(Value::String(reason)) => Some(reason.clone()),
        Some(Value::Object(error)) => error
            .get("message")
            .or_else(|| error.get("code"))
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    };

    explicit
        .or_else(|| {
            attributes
                .pointer("/payload/data/0/attributes/code")
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .or_else(|| attributes.get("status").map(ToString::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

impl RestClient {
    /// Waits for a job using the configured [`JobPollPolicy`].
    ///
    /// # Errors
    ///
    /// See [`wait_for_job_with`](Self::wait_for_job_with).
    pub async fn wait_for_job(&self, handle: &JobHandle) -> Result<Value, ResourceError> {
        let policy = self.config().job_poll_policy().clone();
        self.wait_for_job_with(handle, &policy, None).await
    }

    /// Polls `job-results/{id}` until the job finishes.
    ///
    /// The first poll is immediate; later polls follow `policy`. A `404`
    /// means the result is not published yet and counts as pending.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::JobFailed`] when the job reports failure
    /// - [`ResourceError::JobTimeout`] when `policy.timeout` elapses first
    /// - [`ResourceError::Cancelled`] when `cancellation` fires
    /// - any transport error from a poll
    pub async fn wait_for_job_with(
        &self,
        handle: &JobHandle,
        policy: &JobPollPolicy,
        cancellation: Option<CancellationToken>,
    ) -> Result<Value, ResourceError> {
        let path = build_path(JOB_RESULT_PATH, &[("id", &handle.id)]).ok_or(
            ResourceError::PathResolutionFailed {
                resource: "JobResult",
                operation: "find",
            },
        )?;

        let started = Instant::now();
        let mut interval = policy.initial_interval;
        let mut polls: u32 = 0;

        loop {
            polls += 1;
            let status = match self
                .send(HttpMethod::Get, &path, None, Vec::new(), cancellation.clone())
                .await
            {
                Ok(response) => JobStatus::from_body(&response.body),
                Err(RestError::Http(HttpError::Response(e))) if e.code == 404 => {
                    JobStatus::Pending
                }
                Err(e) => {
                    return Err(ResourceError::from_rest_error(
                        e,
                        "JobResult",
                        Some(&handle.id),
                    ))
                }
            };

            debug!(job_id = %handle.id, polls, ?status, "Polled job result");

            match status {
                JobStatus::Success(result) => return Ok(result),
                JobStatus::Failed { reason, payload } => {
                    return Err(ResourceError::JobFailed { reason, payload })
                }
                JobStatus::Pending => {}
            }

            let elapsed = started.elapsed();
            if elapsed >= policy.timeout {
                return Err(ResourceError::JobTimeout {
                    job_id: handle.id.clone(),
                    elapsed,
                });
            }

            let delay = interval.min(policy.timeout.saturating_sub(elapsed));
            sleep_or_cancel(delay, cancellation.as_ref())
                .await
                .map_err(|_| ResourceError::Cancelled)?;
            interval = policy.next_interval(interval.max(Duration::from_millis(1)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_handle_from_job_document() {
        let handle = JobHandle::from_body(&json!({"data": {"type": "job", "id": "4235"}}));
        assert_eq!(handle, Some(JobHandle::new("4235")));

        let numeric = JobHandle::from_body(&json!({"data": {"type": "job", "id": 7}}));
        assert_eq!(numeric, Some(JobHandle::new("7")));
    }

    #[test]
    fn test_handle_ignores_other_documents() {
        assert!(JobHandle::from_body(&json!({"data": {"type": "upload", "id": "1"}})).is_none());
        assert!(JobHandle::from_body(&json!({})).is_none());
    }

    #[test]
    fn test_flat_statuses() {
        assert_eq!(JobStatus::from_body(&json!({"status": "pending"})), JobStatus::Pending);
        assert_eq!(JobStatus::from_body(&json!({"status": "running"})), JobStatus::Pending);
        assert_eq!(
            JobStatus::from_body(&json!({"status": "success", "result": {"deleted": 2}})),
            JobStatus::Success(json!({"deleted": 2}))
        );
        assert!(matches!(
            JobStatus::from_body(&json!({"status": "failed", "error": "x"})),
            JobStatus::Failed { reason, .. } if reason == "x"
        ));
    }

    #[test]
    fn test_envelope_with_http_status() {
        let body = json!({
            "data": {
                "type": "job_result",
                "id": "4235",
                "attributes": {"status": 200, "payload": {"data": []}}
            }
        });
        assert_eq!(JobStatus::from_body(&body), JobStatus::Success(json!({"data": []})));

        let failed = json!({
            "data": {
                "type": "job_result",
                "id": "4235",
                "attributes": {
                    "status": 422,
                    "payload": {
                        "data": [{"type": "api_error", "attributes": {"code": "INVALID_FIELD"}}]
                    }
                }
            }
        });
        assert!(matches!(
            JobStatus::from_body(&failed),
            JobStatus::Failed { reason, .. } if reason == "INVALID_FIELD"
        ));
    }

    #[test]
    fn test_unknown_status_is_terminal() {
        let status = JobStatus::from_body(&json!({"status": "exploded"}));
        assert!(status.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }
}
