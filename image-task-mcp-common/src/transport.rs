//! How the image task server talks to its MCP host.
//!
//! Agent hosts normally spawn the server and speak MCP over its stdin/stdout,
//! which is the default. `--transport http` instead serves streamable HTTP at
//! `/mcp` next to the `/status` probe; `--port` (or `PORT`) is the first port
//! tried, later ones are probed by the server builder when it is taken.
//!
//! ```ignore
//! use clap::Parser;
//! use image_task_mcp_common::transport::TransportArgs;
//!
//! #[derive(Parser)]
//! struct Args {
//!     #[command(flatten)]
//!     transport: TransportArgs,
//! }
//!
//! let transport = Args::parse().transport.into_transport();
//! ```

use clap::Args;
use std::fmt;

use crate::config::DEFAULT_PORT;

/// Resolved transport the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Stdio,
    Http {
        /// Preferred listen port
        port: u16,
    },
}

impl Transport {
    pub fn http(port: u16) -> Self {
        Transport::Http { port }
    }

    /// Preferred listen port; stdio has none.
    pub fn port(&self) -> Option<u16> {
        match self {
            Transport::Http { port } => Some(*port),
            Transport::Stdio => None,
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stdio => f.write_str("stdio"),
            Transport::Http { port } => write!(f, "http (port {})", port),
        }
    }
}

/// `--transport` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    #[default]
    Stdio,
    Http,
}

pub(crate) fn parse_transport_mode(s: &str) -> Result<TransportMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "stdio" => Ok(TransportMode::Stdio),
        "http" => Ok(TransportMode::Http),
        _ => Err(format!(
            "Invalid transport mode '{}'. Valid options: stdio, http",
            s
        )),
    }
}

/// Transport flags, flattened into the server's CLI.
#[derive(Args, Debug, Clone)]
pub struct TransportArgs {
    /// stdio (spawned by an agent host) or http (streamable HTTP at /mcp)
    #[arg(long, default_value = "stdio", value_parser = parse_transport_mode)]
    pub transport: TransportMode,

    /// First port tried in http mode
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl TransportArgs {
    /// The port only matters in http mode and is dropped otherwise.
    pub fn into_transport(self) -> Transport {
        match self.transport {
            TransportMode::Stdio => Transport::Stdio,
            TransportMode::Http => Transport::http(self.port),
        }
    }
}

impl Default for TransportArgs {
    fn default() -> Self {
        Self {
            transport: TransportMode::Stdio,
            port: DEFAULT_PORT,
        }
    }
}
