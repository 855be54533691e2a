//! Image Task MCP Common Library
//!
//! Shared utilities for configuration, credentials, error handling, tracing
//! and server bootstrap used by the image task MCP server.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod tracing;
pub mod transport;


pub use auth::ApiKey;
pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use server::{McpServerBuilder, ServerError, ServerIdentity, shutdown_channel};
pub use transport::{Transport, TransportArgs, TransportMode};
