//! Workspace-level integration tests for the image task MCP server.
//!
//! These tests verify:
//! - The server can be built from environment-style configuration
//! - The generateImage tool schema is well formed
//! - Tool arguments are validated before any remote call
//! - Tool results are well-formed MCP content

pub mod server_startup;
pub mod tool_schema;
pub mod input_validation;
pub mod output_format;
