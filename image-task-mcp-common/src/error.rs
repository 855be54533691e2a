//! Error types for the common library.
//!
//! This module provides a unified error hierarchy using `thiserror` for consistent
//! error handling across the image task server.
//!
//! # Error Categories
//!
//! - `ConfigError`: Missing or invalid configuration, fatal at startup
//! - `Error::Submission`: The remote API refused or never received a task
//! - `Error::Query`: A task status check failed
//! - `Error::TaskFailed`: The remote task reached its failed state
//! - `Error::Timeout`: The task stayed non-terminal for every allowed poll
//! - `Error::InvalidResult`: The task completed without a usable image URL
//! - `Error::Cancelled`: The caller stopped waiting
//! - `Error::Validation`: Tool arguments that cannot be turned into a request
//! - `Error::Http`: The HTTP client could not be built
//!
//! The `Display` output of the task variants is the message shown to the user,
//! so it carries no prefix.

use thiserror::Error;

/// Message reported when a task never reaches a terminal state.
pub const TIMEOUT_MESSAGE: &str = "Processing timeout, please try again later";

/// Message reported when a generation is cancelled while polling.
pub const CANCELLED_MESSAGE: &str = "Generation cancelled";

/// Unified error type for the image task server.
#[derive(Debug, Error)]
pub enum Error {
    /// Task submission failed.
    ///
    /// `code` is passed through verbatim from the remote envelope when present.
    #[error("{message}")]
    Submission {
        /// Human-readable failure description
        message: String,
        /// Remote error code, if the API supplied one
        code: Option<serde_json::Value>,
    },

    /// A status query failed (transport, envelope or parse failure)
    #[error("{0}")]
    Query(String),

    /// The remote task reported a terminal failure
    #[error("{0}")]
    TaskFailed(String),

    /// The attempt ceiling was reached while the task was still running
    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout {
        /// Number of status queries issued before giving up
        attempts: u32,
    },

    /// The task completed but produced nothing usable
    #[error("{0}")]
    InvalidResult(String),

    /// Polling was cancelled by the caller
    #[error("{}", CANCELLED_MESSAGE)]
    Cancelled,

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP client construction errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a new submission error.
    ///
    /// # Example
    ///
    /// ```
    /// use image_task_mcp_common::error::Error;
    ///
    /// let err = Error::submission("bad prompt", Some(serde_json::json!(42)));
    /// assert_eq!(err.to_string(), "bad prompt");
    /// assert_eq!(err.code(), Some(&serde_json::json!(42)));
    /// ```
    pub fn submission(message: impl Into<String>, code: Option<serde_json::Value>) -> Self {
        Error::Submission {
            message: message.into(),
            code,
        }
    }

    /// Create a new status query error.
    pub fn query(message: impl Into<String>) -> Self {
        Error::Query(message.into())
    }

    /// Create a new task failure error.
    pub fn task_failed(message: impl Into<String>) -> Self {
        Error::TaskFailed(message.into())
    }

    /// Create a new timeout error.
    ///
    /// # Example
    ///
    /// ```
    /// use image_task_mcp_common::error::{Error, TIMEOUT_MESSAGE};
    ///
    /// let err = Error::timeout(50);
    /// assert_eq!(err.to_string(), TIMEOUT_MESSAGE);
    /// ```
    pub fn timeout(attempts: u32) -> Self {
        Error::Timeout { attempts }
    }

    /// Create a new invalid result error.
    pub fn invalid_result(message: impl Into<String>) -> Self {
        Error::InvalidResult(message.into())
    }

    /// Create a new validation error.
    ///
    /// # Example
    ///
    /// ```
    /// use image_task_mcp_common::error::Error;
    ///
    /// let err = Error::validation("imageBase64 is not valid base64");
    /// assert!(err.to_string().contains("imageBase64"));
    /// ```
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Remote error code attached to a submission failure, if any.
    pub fn code(&self) -> Option<&serde_json::Value> {
        match self {
            Error::Submission { code, .. } => code.as_ref(),
            _ => None,
        }
    }
}

/// Configuration errors.
///
/// These errors occur when loading or validating configuration from
/// environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Required environment variable {0} is not set")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new missing environment variable error.
    pub fn missing_env_var(name: impl Into<String>) -> Self {
        ConfigError::MissingEnvVar(name.into())
    }

    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_error_displays_remote_message() {
        let err = Error::submission("bad prompt", Some(serde_json::json!(42)));
        assert_eq!(err.to_string(), "bad prompt");
        assert_eq!(err.code(), Some(&serde_json::json!(42)));
    }

    #[test]
    fn test_code_is_none_for_other_variants() {
        assert!(Error::query("boom").code().is_none());
        assert!(Error::task_failed("boom").code().is_none());
        assert!(Error::Cancelled.code().is_none());
    }

    #[test]
    fn test_config_error_includes_var_name() {
        let err = ConfigError::missing_env_var("API_KEY");
        assert!(err.to_string().contains("API_KEY"), "Should contain variable name");
    }

    #[test]
    fn test_timeout_and_cancel_messages() {
        assert_eq!(Error::timeout(3).to_string(), TIMEOUT_MESSAGE);
        assert_eq!(Error::Cancelled.to_string(), CANCELLED_MESSAGE);
    }

    #[test]
    fn test_validation_error() {
        let msg = Error::validation("prompt too long").to_string();
        assert!(msg.contains("Validation"), "Should mention validation");
        assert!(msg.contains("prompt too long"), "Should contain message");
    }
}
