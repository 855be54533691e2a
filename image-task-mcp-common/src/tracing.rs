//! Tracing initialization for the image task server.
//!
//! Logs are always written to stderr: with the stdio transport, stdout carries
//! the MCP protocol stream and must stay clean.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls the log level and filtering. Examples:
//!   - `RUST_LOG=debug` - Enable debug logging for all modules
//!   - `RUST_LOG=image_task_mcp=debug` - Per-poll logging for the server crate
//!   - `RUST_LOG=warn,image_task_mcp_common=debug` - Warn by default, debug for common

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
    util::TryInitError,
};

fn subscriber_layers(
    default_level: &str,
) -> (EnvFilter, impl tracing_subscriber::Layer<tracing_subscriber::Registry>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    (env_filter, fmt_layer)
}

/// Initialize the tracing subscriber with `RUST_LOG` filtering (default `info`).
///
/// # Panics
///
/// Panics if a global subscriber is already set.
///
/// # Example
///
/// ```no_run
/// use image_task_mcp_common::tracing::init_tracing;
///
/// init_tracing();
/// tracing::info!("Server starting");
/// ```
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Initialize tracing with a custom default level used when `RUST_LOG` is unset.
pub fn init_tracing_with_default(default_level: &str) {
    let (env_filter, fmt_layer) = subscriber_layers(default_level);
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

/// Try to initialize tracing, returning an error if already initialized.
///
/// ```
/// use image_task_mcp_common::tracing::try_init_tracing;
///
/// // Ok or Err depending on prior initialization, never a panic
/// let _ = try_init_tracing();
/// ```
pub fn try_init_tracing() -> Result<(), TryInitError> {
    let (env_filter, fmt_layer) = subscriber_layers("info");
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
}
