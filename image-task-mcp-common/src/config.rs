//! Configuration module for loading environment variables and settings.

use std::time::Duration;

use crate::auth::ApiKey;
use crate::error::ConfigError;

/// Default base URL of the remote image API.
pub const DEFAULT_BASE_URL: &str = "https://4o-image.app";

/// Default server name reported to MCP clients.
pub const DEFAULT_SERVER_NAME: &str = "image-task-mcp";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default delay between two status queries.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

/// Default number of status queries before giving up.
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 50;

/// Default per-request network timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Subscription key for the remote API (required)
    pub api_key: ApiKey,
    /// Base URL of the remote API, without a trailing slash
    pub base_url: String,
    /// Server name reported to clients
    pub server_name: String,
    /// Server version reported to clients
    pub server_version: String,
    /// HTTP server port
    pub port: u16,
    /// Delay between status queries
    pub poll_interval: Duration,
    /// Maximum number of status queries per task
    pub poll_max_attempts: u32,
    /// Network timeout applied to every remote call
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables and .env file.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingEnvVar` if API_KEY is not set, and
    /// `ConfigError::InvalidValue` for unparseable polling settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of touching the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(ApiKey::new)
            .ok_or_else(|| ConfigError::missing_env_var("API_KEY"))?;

        let base_url = lookup("API_BASE_URL")
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let server_name =
            lookup("SERVER_NAME").unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());

        let server_version =
            lookup("SERVER_VERSION").unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let poll_interval_ms =
            parse_number(&lookup, "POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS, 0)?;
        let poll_max_attempts =
            parse_number(&lookup, "POLL_MAX_ATTEMPTS", DEFAULT_POLL_MAX_ATTEMPTS, 1)?;
        let request_timeout_secs =
            parse_number(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS, 1)?;

        Ok(Self {
            api_key,
            base_url,
            server_name,
            server_version,
            port,
            poll_interval: Duration::from_millis(poll_interval_ms),
            poll_max_attempts,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Endpoint for submitting a new image task.
    pub fn submit_endpoint(&self) -> String {
        format!("{}/api/image/api/4oimage", self.base_url)
    }

    /// Endpoint for querying the status of a task. `task_id` is percent-encoded.
    pub fn task_endpoint(&self, task_id: &str) -> String {
        format!(
            "{}/api/image/api/task/{}",
            self.base_url,
            urlencoding::encode(task_id)
        )
    }
}

fn parse_number<F, T>(lookup: &F, name: &str, default: T, min: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + std::fmt::Display + Copy,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_value(name, format!("'{}' is not a number", raw)))?;
    if value < min {
        return Err(ConfigError::invalid_value(
            name,
            format!("must be at least {}", min),
        ));
    }
    Ok(value)
}
