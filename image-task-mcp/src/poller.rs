//! Fixed-interval polling of a remote task until it reaches a terminal state.
//!
//! The poller is a plain loop over one task handle:
//!
//! ```text
//! Polling(n) --poll error-------------> QueryError
//!            --status == completed----> Succeeded(result)
//!            --status == failed-------> Failed(reason)
//!            --n + 1 >= max_attempts--> TimedOut
//!            --cancelled--------------> Cancelled
//!            --otherwise: sleep-------> Polling(n + 1)
//! ```
//!
//! The first status query is issued immediately. Each following query starts
//! only after the previous one finished and the interval elapsed, so queries
//! never overlap.

use std::time::Duration;

use image_task_mcp_common::config::{Config, DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_MAX_ATTEMPTS};
use image_task_mcp_common::error::Error;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::client::{TaskBackend, TaskHandle, TaskStatus};

const TASK_FAILED: &str = "Task processing failed";

/// Polling cadence and attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between the end of one query and the start of the next.
    pub interval: Duration,
    /// Number of non-terminal readings tolerated before timing out.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

impl From<&Config> for PollConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.poll_max_attempts,
        }
    }
}

/// Progress of a task that is still running.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub status: TaskStatus,
    pub progress: f64,
}

/// Receives progress for non-terminal readings.
///
/// Never called after the poller has reached a terminal state.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, update: ProgressUpdate);
}

/// Forward progress into a channel the caller drains at its own pace.
/// A closed receiver is ignored.
impl ProgressObserver for UnboundedSender<ProgressUpdate> {
    fn on_progress(&self, update: ProgressUpdate) {
        let _ = self.send(update);
    }
}

/// Emits each update as a debug log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&self, update: ProgressUpdate) {
        debug!(status = %update.status, progress = update.progress, "Task in progress");
    }
}

/// Drives status queries for one task until a terminal state.
pub struct TaskPoller<'a> {
    backend: &'a dyn TaskBackend,
    config: PollConfig,
}

impl<'a> TaskPoller<'a> {
    pub fn new(backend: &'a dyn TaskBackend, config: PollConfig) -> Self {
        Self { backend, config }
    }

    /// Poll `handle` until it completes, fails, times out or is cancelled.
    ///
    /// # Returns
    /// * `Ok(result)` - the task completed; `result` is its (possibly absent) payload
    /// * `Err(Error::Query)` - a status query failed; no further queries are made
    /// * `Err(Error::TaskFailed)` - the task reported failure
    /// * `Err(Error::Timeout)` - `max_attempts` non-terminal readings were seen
    /// * `Err(Error::Cancelled)` - `cancel` fired before a terminal reading
    #[instrument(level = "info", name = "poll_until_complete", skip_all, fields(task_id = %handle))]
    pub async fn run(
        &self,
        handle: &TaskHandle,
        observer: Option<&dyn ProgressObserver>,
        cancel: &CancellationToken,
    ) -> Result<Option<Value>, Error> {
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                info!(attempts, "Polling cancelled");
                return Err(Error::Cancelled);
            }

            let snapshot = self.backend.poll(handle).await.inspect_err(|e| {
                warn!(attempts, error = %e, "Task status query failed");
            })?;

            match snapshot.status {
                TaskStatus::Completed => {
                    info!(attempts, "Task completed");
                    return Ok(snapshot.result);
                }
                TaskStatus::Failed => {
                    let reason = snapshot.error.unwrap_or_else(|| TASK_FAILED.to_string());
                    warn!(attempts, reason = %reason, "Task failed");
                    return Err(Error::task_failed(reason));
                }
                status => {
                    if let Some(observer) = observer {
                        observer.on_progress(ProgressUpdate {
                            status,
                            progress: snapshot.progress,
                        });
                    }
                }
            }

            attempts += 1;
            if attempts >= self.config.max_attempts {
                warn!(attempts, "Task did not finish before the attempt limit");
                return Err(Error::timeout(attempts));
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(attempts, "Polling cancelled");
                    return Err(Error::Cancelled);
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }
}
