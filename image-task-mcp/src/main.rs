//! Image Task MCP Server
//!
//! MCP server that generates and edits images through a remote task API.

use anyhow::Result;
use clap::Parser;
use image_task_mcp::ImageServer;
use image_task_mcp_common::tracing::init_tracing;
use image_task_mcp_common::{Config, McpServerBuilder, ServerIdentity, TransportArgs};

/// Command-line arguments for the image task server.
#[derive(Parser, Debug)]
#[command(name = "image-task-mcp")]
#[command(about = "MCP server for remote image generation and editing")]
struct Args {
    /// Transport configuration
    #[command(flatten)]
    transport: TransportArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    tracing::info!("image-task-mcp server starting...");

    // Parse command-line arguments
    let args = Args::parse();

    // Load configuration; a missing API_KEY is fatal
    let config = Config::from_env()?;
    tracing::info!(
        base_url = %config.base_url,
        server_name = %config.server_name,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        poll_max_attempts = config.poll_max_attempts,
        "Configuration loaded"
    );

    let identity = ServerIdentity::new(config.server_name.clone(), config.server_version.clone());

    // Create the server handler
    let server = ImageServer::new(config)?;

    // Build and run the MCP server
    let transport = args.transport.into_transport();

    McpServerBuilder::new(server)
        .with_transport(transport)
        .with_identity(identity)
        .run()
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
