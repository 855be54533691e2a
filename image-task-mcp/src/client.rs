//! HTTP client for the remote image task API.
//!
//! Two calls are exposed, both authenticated with the subscription header:
//!
//! - `POST {base}/api/image/api/4oimage` submits a multipart task
//! - `GET {base}/api/image/api/task/{id}` reads the task status
//!
//! Neither call retries. Failures are surfaced immediately and the poller
//! decides what to do with them.

use std::fmt;

use async_trait::async_trait;
use image_task_mcp_common::auth::SUBSCRIPTION_HEADER;
use image_task_mcp_common::config::Config;
use image_task_mcp_common::error::Error;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::handler::GenerationRequest;

/// File name attached to the uploaded image part.
pub const IMAGE_FILE_NAME: &str = "image.jpg";

/// Content type attached to the uploaded image part.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

const SUBMISSION_FAILED: &str = "Task submission failed";
const QUERY_FAILED: &str = "Task query failed";

/// Opaque task identifier returned by the submission call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote task state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Failed,
    /// Any status string the API adds later; treated as still in progress.
    Other(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Other(s) => s,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => TaskStatus::Queued,
            "running" => TaskStatus::Running,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Other(s),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status reading. Produced fresh on every poll and never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    /// Progress as reported by the API, `0.0` when absent.
    pub progress: f64,
    /// Result payload, normally only present once completed.
    pub result: Option<Value>,
    /// Failure reason, normally only present once failed.
    pub error: Option<String>,
}

/// The two remote operations the generation flow depends on.
///
/// `TaskClient` is the HTTP implementation; tests substitute scripted backends.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Submit a new task and return its handle.
    async fn submit(&self, request: GenerationRequest) -> Result<TaskHandle, Error>;

    /// Read the current state of a task. A single attempt, no retry.
    async fn poll(&self, handle: &TaskHandle) -> Result<TaskSnapshot, Error>;
}

/// Strip carriage returns and line feeds from a prompt before sending it.
pub fn normalize_prompt(prompt: &str) -> String {
    prompt.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

// =============================================================================
// Wire Types
// =============================================================================

/// Response envelope of the submission endpoint.
#[derive(Debug, Deserialize)]
struct SubmitEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    task_id: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

/// Response envelope of the status endpoint.
#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    task: Option<TaskBody>,
    #[serde(default)]
    error: Option<String>,
}

/// Task body as the API sends it. Fields are read loosely: a missing or odd
/// status keeps the task polling, and a malformed progress reads as zero.
#[derive(Debug, Deserialize)]
struct TaskBody {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    progress: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl From<TaskBody> for TaskSnapshot {
    fn from(body: TaskBody) -> Self {
        let status = match body.status {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let error = match body.error {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            Some(Value::String(_)) | Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };
        Self {
            status: status.into(),
            progress: progress_value(body.progress.as_ref()),
            result: body.result,
            error,
        }
    }
}

/// Numeric progress, also accepted as a numeric string; anything else is `0.0`.
fn progress_value(progress: Option<&Value>) -> f64 {
    let parsed = match progress {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite()).unwrap_or(0.0)
}

/// Task ids are strings in practice; numeric ids are accepted as well.
fn task_id_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// HTTP Client
// =============================================================================

/// HTTP implementation of [`TaskBackend`].
///
/// Holds one `reqwest::Client` (with the configured request timeout) and the
/// API key; both are shared read-only by concurrent generations.
#[derive(Clone)]
pub struct TaskClient {
    config: Config,
    http: reqwest::Client,
}

impl TaskClient {
    /// Create a client whose every request is bounded by `config.request_timeout`.
    ///
    /// # Errors
    /// Returns `Error::Http` if the underlying HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    /// Create a client around an existing HTTP client.
    pub fn with_http(config: Config, http: reqwest::Client) -> Self {
        Self { config, http }
    }
}

#[async_trait]
impl TaskBackend for TaskClient {
    #[instrument(
        level = "info",
        name = "submit_task",
        skip_all,
        fields(has_image = request.image.is_some())
    )]
    async fn submit(&self, request: GenerationRequest) -> Result<TaskHandle, Error> {
        let GenerationRequest { image, prompt } = request;
        let prompt = normalize_prompt(&prompt);

        let mut form = Form::new();
        if let Some(image) = image {
            let part = Part::bytes(image)
                .file_name(IMAGE_FILE_NAME)
                .mime_str(IMAGE_CONTENT_TYPE)
                .map_err(|e| {
                    Error::submission(format!("Failed to build image part: {}", e), None)
                })?;
            form = form.part("image", part);
        }
        if !prompt.is_empty() {
            form = form.text("prompt", prompt);
        }

        let endpoint = self.config.submit_endpoint();
        debug!(endpoint = %endpoint, "Submitting image task");

        let response = self
            .http
            .post(&endpoint)
            .header(SUBSCRIPTION_HEADER, self.config.api_key.expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::submission(format!("Request failed: {}", e), None))?;

        let status = response.status();
        let envelope: SubmitEnvelope = response.json().await.map_err(|e| {
            Error::submission(
                format!("Failed to parse submission response (HTTP {}): {}", status.as_u16(), e),
                None,
            )
        })?;

        if !envelope.success {
            return Err(Error::submission(
                envelope.error.unwrap_or_else(|| SUBMISSION_FAILED.to_string()),
                envelope.code,
            ));
        }

        let task_id = envelope
            .task_id
            .and_then(task_id_string)
            .ok_or_else(|| Error::submission("Task submission returned no task id", None))?;

        info!(task_id = %task_id, "Image task submitted");
        Ok(TaskHandle::new(task_id))
    }

    #[instrument(level = "debug", name = "poll_task", skip(self), fields(task_id = %handle))]
    async fn poll(&self, handle: &TaskHandle) -> Result<TaskSnapshot, Error> {
        let endpoint = self.config.task_endpoint(handle.as_str());

        let response = self
            .http
            .get(&endpoint)
            .header(SUBSCRIPTION_HEADER, self.config.api_key.expose())
            .send()
            .await
            .map_err(|e| Error::query(format!("Status request failed: {}", e)))?;

        let status = response.status();
        let envelope: QueryEnvelope = response.json().await.map_err(|e| {
            Error::query(format!(
                "Failed to parse task status (HTTP {}): {}",
                status.as_u16(),
                e
            ))
        })?;

        if !envelope.success {
            return Err(Error::query(
                envelope.error.unwrap_or_else(|| QUERY_FAILED.to_string()),
            ));
        }

        let task = envelope
            .task
            .ok_or_else(|| Error::query("Task status response contained no task"))?;

        Ok(task.into())
    }
}
