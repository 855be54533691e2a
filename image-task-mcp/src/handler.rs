//! Image generation handler for the MCP server.
//!
//! `ImageHandler::generate` runs one generation end to end: submit the task,
//! poll it to a terminal state, recover the image URL from the result and
//! fold every failure into a [`GenerationOutcome`]. It never returns an error
//! and never panics on remote input.

use std::sync::Arc;
use std::time::Instant;

use image_task_mcp_common::config::Config;
use image_task_mcp_common::error::Error;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::client::{TaskBackend, TaskClient};
use crate::normalize::{image_url, is_set, normalize_result};
use crate::poller::{PollConfig, ProgressObserver, TaskPoller};

/// Failure message when a completed task's result is a bare string, number or `true`.
pub const INVALID_RESULT_OBJECT: &str = "Invalid result object";

/// Failure message when no usable image URL could be found.
pub const INVALID_IMAGE_URL: &str = "Invalid image URL";

/// One image generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Optional source image for editing; sent as `image.jpg`.
    pub image: Option<Vec<u8>>,
    /// Text prompt. May be empty when an image is supplied.
    pub prompt: String,
}

impl GenerationRequest {
    /// Text-to-image request.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            image: None,
            prompt: prompt.into(),
        }
    }

    /// Image editing request.
    pub fn with_image(image: Vec<u8>, prompt: impl Into<String>) -> Self {
        Self {
            image: Some(image),
            prompt: prompt.into(),
        }
    }
}

/// Final result of a generation.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success {
        image_url: String,
    },
    Failure {
        error: String,
        /// Error code from the remote API, only set for submission failures.
        code: Option<Value>,
    },
}

impl GenerationOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        GenerationOutcome::Failure {
            error: error.into(),
            code: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Success { image_url } => Some(image_url.as_str()),
            GenerationOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Success { .. } => None,
            GenerationOutcome::Failure { error, .. } => Some(error.as_str()),
        }
    }

    pub fn code(&self) -> Option<&Value> {
        match self {
            GenerationOutcome::Success { .. } => None,
            GenerationOutcome::Failure { code, .. } => code.as_ref(),
        }
    }
}

impl From<Error> for GenerationOutcome {
    fn from(err: Error) -> Self {
        let code = err.code().cloned();
        GenerationOutcome::Failure {
            error: err.to_string(),
            code,
        }
    }
}

/// Flat wire shape: `{success, imageUrl?, error?, errorCode?}`.
impl Serialize for GenerationOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Flat<'a> {
            success: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            image_url: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error_code: Option<&'a Value>,
        }

        Flat {
            success: self.is_success(),
            image_url: self.image_url(),
            error: self.error(),
            error_code: self.code(),
        }
        .serialize(serializer)
    }
}

/// Image generation handler.
///
/// Cheap to share: the backend sits behind an `Arc` and the poll settings are `Copy`.
#[derive(Clone)]
pub struct ImageHandler {
    backend: Arc<dyn TaskBackend>,
    poll: PollConfig,
}

impl ImageHandler {
    /// Create a handler talking to the configured remote API.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, Error> {
        let poll = PollConfig::from(&config);
        let client = TaskClient::new(config)?;
        Ok(Self::with_backend(Arc::new(client), poll))
    }

    /// Create a handler around any backend.
    pub fn with_backend(backend: Arc<dyn TaskBackend>, poll: PollConfig) -> Self {
        Self { backend, poll }
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    /// Generate one image.
    ///
    /// Submission failures return immediately with the remote error and code;
    /// no status query is made. Everything else is reported through the
    /// returned outcome as well.
    #[instrument(
        level = "info",
        name = "generate_image",
        skip_all,
        fields(has_image = request.image.is_some(), prompt_len = request.prompt.len())
    )]
    pub async fn generate(
        &self,
        request: GenerationRequest,
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> GenerationOutcome {
        let started = Instant::now();
        let outcome = match self.run(request, observer, cancel).await {
            Ok(image_url) => GenerationOutcome::Success { image_url },
            Err(err) => err.into(),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            GenerationOutcome::Success { image_url } => {
                info!(elapsed_ms, image_url = %image_url, "Image generated");
            }
            GenerationOutcome::Failure { error, .. } => {
                warn!(elapsed_ms, error = %error, "Image generation failed");
            }
        }
        outcome
    }

    async fn run(
        &self,
        request: GenerationRequest,
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        let handle = self.backend.submit(request).await?;

        let result = TaskPoller::new(self.backend.as_ref(), self.poll)
            .run(&handle, observer, cancel)
            .await?;

        // An empty result reads as an empty object and ends as "Invalid image URL"
        let mut payload = match result {
            Some(value) if is_set(&value) => value,
            _ => Value::Object(Map::new()),
        };
        if !(payload.is_object() || payload.is_array()) {
            return Err(Error::invalid_result(INVALID_RESULT_OBJECT));
        }
        normalize_result(&mut payload);

        match image_url(&payload) {
            Some(url) if url.starts_with("http") => Ok(url.to_string()),
            _ => Err(Error::invalid_result(INVALID_IMAGE_URL)),
        }
    }
}
