//! MCP Server builder utilities.
//!
//! This module runs an rmcp handler over the selected transport with graceful
//! shutdown. In HTTP mode it also serves a small auxiliary surface next to
//! the MCP endpoint:
//!
//! - `/mcp`: streamable HTTP MCP endpoint
//! - `/status`: liveness probe with the number of in-flight MCP connections
//! - anything else: `404 {"error": "Resource not found"}`
//!
//! # Example
//!
//! ```ignore
//! use image_task_mcp_common::server::{McpServerBuilder, ServerIdentity};
//! use image_task_mcp_common::transport::Transport;
//!
//! McpServerBuilder::new(handler)
//!     .with_transport(Transport::http(8080))
//!     .with_identity(ServerIdentity::new("image-task-mcp", "0.1.0"))
//!     .run()
//!     .await?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rmcp::{ServerHandler, ServiceExt};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::transport::Transport;

/// How many consecutive ports HTTP mode tries before giving up.
pub const DEFAULT_PORT_ATTEMPTS: u16 = 10;

/// Errors that can occur when running an MCP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified port
    #[error("Failed to bind to port {port}: {message}")]
    BindFailed { port: u16, message: String },

    /// Transport error during communication
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Name and version reported by `/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerIdentity {
    pub name: String,
    pub version: String,
}

impl ServerIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ServerIdentity {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SERVER_NAME, env!("CARGO_PKG_VERSION"))
    }
}

/// Shared state behind the auxiliary HTTP routes.
#[derive(Debug, Clone, Default)]
pub struct StatusState {
    identity: ServerIdentity,
    active: Arc<AtomicUsize>,
}

impl StatusState {
    pub fn new(identity: ServerIdentity) -> Self {
        Self {
            identity,
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of MCP requests currently being served.
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    status: &'static str,
    active_connections: usize,
    server_info: ServerIdentity,
}

/// Decrements the connection count when the request finishes or is dropped.
struct ConnectionGuard(Arc<AtomicUsize>);

impl ConnectionGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn track_connection(
    State(state): State<StatusState>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = ConnectionGuard::enter(&state.active);
    tracing::debug!(
        method = %request.method(),
        active = state.active_connections(),
        "MCP connection opened"
    );
    next.run(request).await
}

async fn status(State(state): State<StatusState>) -> Json<StatusBody> {
    let active_connections = state.active_connections();
    tracing::debug!(active_connections, "Status check");
    Json(StatusBody {
        status: "ok",
        active_connections,
        server_info: state.identity.clone(),
    })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Resource not found" })),
    )
}

/// Wrap an MCP router with connection tracking, `/status` and the 404 fallback.
pub fn with_status_routes(mcp: Router, state: StatusState) -> Router {
    let tracked = mcp.layer(middleware::from_fn_with_state(state.clone(), track_connection));
    let aux = Router::new()
        .route("/status", get(status))
        .with_state(state);

    tracked.merge(aux).fallback(not_found)
}

/// Bind the first free port in `start..start + attempts`.
///
/// Only "address in use" moves on to the next port; any other bind error is
/// returned immediately.
pub async fn bind_with_fallback(start: u16, attempts: u16) -> Result<TcpListener, ServerError> {
    let mut last_port = start;
    let mut last_error = String::from("no ports attempted");

    for offset in 0..attempts.max(1) {
        let Some(port) = start.checked_add(offset) else {
            break;
        };
        last_port = port;

        match TcpListener::bind(("0.0.0.0", port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::warn!(port, "Port is in use, trying next port");
                last_error = e.to_string();
            }
            Err(e) => {
                return Err(ServerError::BindFailed {
                    port,
                    message: e.to_string(),
                });
            }
        }
    }

    Err(ServerError::BindFailed {
        port: last_port,
        message: format!("could not find an available port ({})", last_error),
    })
}

/// Builder for configuring and running MCP servers.
pub struct McpServerBuilder<H> {
    handler: H,
    transport: Transport,
    identity: ServerIdentity,
    port_attempts: u16,
    shutdown_rx: Option<oneshot::Receiver<()>>,
}

impl<H> McpServerBuilder<H>
where
    H: ServerHandler + Clone + Send + Sync + 'static,
{
    /// Create a new server builder with the given handler.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            transport: Transport::default(),
            identity: ServerIdentity::default(),
            port_attempts: DEFAULT_PORT_ATTEMPTS,
            shutdown_rx: None,
        }
    }

    /// Set the transport mode for the server.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Set the identity reported by `/status`.
    pub fn with_identity(mut self, identity: ServerIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Set how many consecutive ports HTTP mode may try.
    pub fn with_port_attempts(mut self, attempts: u16) -> Self {
        self.port_attempts = attempts;
        self
    }

    /// Set a shutdown signal receiver for graceful shutdown.
    ///
    /// When the sender is dropped or a message is sent, the server
    /// will initiate graceful shutdown.
    pub fn with_shutdown(mut self, shutdown_rx: oneshot::Receiver<()>) -> Self {
        self.shutdown_rx = Some(shutdown_rx);
        self
    }

    /// Run the MCP server with the configured transport.
    ///
    /// Returns once the server is shut down (signal, shutdown channel, or the
    /// stdio peer closing the stream).
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!(transport = %self.transport, "Starting MCP server");

        match self.transport {
            Transport::Stdio => self.run_stdio().await,
            Transport::Http { port } => self.run_http(port).await,
        }
    }

    async fn run_stdio(self) -> Result<(), ServerError> {
        use rmcp::transport::io::stdio;

        let shutdown_future = shutdown_future(self.shutdown_rx);

        let service = self
            .handler
            .serve(stdio())
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        tokio::select! {
            result = service.waiting() => {
                result.map_err(|e| ServerError::Transport(e.to_string()))?;
                Ok(())
            }
            _ = shutdown_future => {
                tracing::info!("Received shutdown signal, stopping server");
                Ok(())
            }
        }
    }

    async fn run_http(self, port: u16) -> Result<(), ServerError> {
        use rmcp::transport::streamable_http_server::{
            StreamableHttpService, session::local::LocalSessionManager,
        };

        let handler = self.handler.clone();
        let service = StreamableHttpService::new(
            move || Ok(handler.clone()),
            LocalSessionManager::default().into(),
            Default::default(),
        );

        let state = StatusState::new(self.identity.clone());
        let router = with_status_routes(Router::new().nest_service("/mcp", service), state);

        let tcp_listener = bind_with_fallback(port, self.port_attempts).await?;
        let bound_port = tcp_listener.local_addr()?.port();

        tracing::info!(
            port = bound_port,
            name = %self.identity.name,
            version = %self.identity.version,
            "HTTP server listening"
        );

        axum::serve(tcp_listener, router)
            .with_graceful_shutdown(shutdown_future(self.shutdown_rx))
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_future(shutdown_rx: Option<oneshot::Receiver<()>>) {
    match shutdown_rx {
        Some(rx) => {
            let _ = rx.await;
        }
        None => wait_for_shutdown_signal().await,
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                    _ = sigint.recv() => tracing::info!("Received SIGINT"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(
                    error = %e,
                    "Failed to register signal handlers, falling back to Ctrl+C"
                );
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Convenience function to set up graceful shutdown handling.
///
/// Returns a sender that can be used to trigger shutdown programmatically,
/// and a receiver to pass to the server builder.
pub fn shutdown_channel() -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
    oneshot::channel()
}
