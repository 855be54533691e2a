//! Image Task MCP Server Library
//!
//! This library exposes a remote image generation API (submit a task, poll it,
//! return the image URL) as a single MCP tool.

pub mod client;
pub mod handler;
pub mod normalize;
pub mod poller;
pub mod server;

pub use client::{TaskBackend, TaskClient, TaskHandle, TaskSnapshot, TaskStatus};
pub use handler::{GenerationOutcome, GenerationRequest, ImageHandler};
pub use poller::{PollConfig, ProgressObserver, ProgressUpdate, TaskPoller};
pub use server::ImageServer;
