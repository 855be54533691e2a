//! MCP Server implementation for the image task server.
//!
//! This module exposes a single `generateImage` tool that covers both
//! text-to-image generation and image editing (prompt plus source image).

use crate::handler::{GenerationOutcome, GenerationRequest, ImageHandler};
use crate::poller::LogProgress;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image_task_mcp_common::config::Config;
use image_task_mcp_common::error::Error;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Name of the only tool this server exposes.
pub const TOOL_NAME: &str = "generateImage";

/// Link appended to every successful generation.
pub const WEBSITE_URL: &str = "https://4o-image.app/";

/// MCP Server for image generation.
#[derive(Clone)]
pub struct ImageServer {
    /// Handler for generation requests
    handler: Arc<ImageHandler>,
    /// Server configuration
    config: Config,
}

/// Tool parameters for generateImage.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateImageToolParams {
    /// Text prompt describing the image to generate, or the edit to apply
    pub prompt: String,
    /// Optional source image for editing, base64 encoded. A `data:image/...;base64,`
    /// prefix is accepted.
    #[serde(rename = "imageBase64", default)]
    pub image_base64: Option<String>,
}

/// Decode a base64 image, tolerating a data URL prefix.
pub fn decode_image_base64(encoded: &str) -> Result<Vec<u8>, Error> {
    let payload = strip_data_url_prefix(encoded.trim());
    STANDARD
        .decode(payload)
        .map_err(|e| Error::validation(format!("imageBase64 is not valid base64: {}", e)))
}

fn strip_data_url_prefix(encoded: &str) -> &str {
    if !encoded.starts_with("data:image/") {
        return encoded;
    }
    match encoded.find(";base64,") {
        Some(idx) => &encoded[idx + ";base64,".len()..],
        None => encoded,
    }
}

/// Text returned for a successful generation.
pub fn format_success(prompt: &str, image_url: &str) -> String {
    format!(
        "Image generated successfully!\n\nPrompt: {}\n\nImage URL: {}\n\nVisit our website: {}",
        prompt, image_url, WEBSITE_URL
    )
}

/// Text returned for a failed generation.
pub fn format_failure(error: &str) -> String {
    format!("Image generation failed: {}", error)
}

fn error_result(message: impl std::fmt::Display) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("Error: {}", message))])
}

impl ImageServer {
    /// Create a new ImageServer with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, Error> {
        let handler = ImageHandler::new(config.clone())?;
        Ok(Self::with_handler(handler, config))
    }

    /// Create a server around an existing handler.
    pub fn with_handler(handler: ImageHandler, config: Config) -> Self {
        Self {
            handler: Arc::new(handler),
            config,
        }
    }

    /// Generate or edit an image.
    ///
    /// Every outcome becomes tool content; failures are flagged with `is_error`.
    pub async fn generate_image(
        &self,
        params: GenerateImageToolParams,
        cancel: &CancellationToken,
    ) -> CallToolResult {
        info!(
            prompt_len = params.prompt.len(),
            has_image = params.image_base64.is_some(),
            "Generating image"
        );

        let image = match params.image_base64.as_deref() {
            Some(encoded) if !encoded.trim().is_empty() => match decode_image_base64(encoded) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(error = %e, "Rejecting image payload");
                    return error_result(e);
                }
            },
            _ => None,
        };

        let request = GenerationRequest {
            image,
            prompt: params.prompt.clone(),
        };

        match self.handler.generate(request, Some(&LogProgress), cancel).await {
            GenerationOutcome::Success { image_url } => CallToolResult::success(vec![Content::text(
                format_success(&params.prompt, &image_url),
            )]),
            GenerationOutcome::Failure { error, .. } => {
                CallToolResult::error(vec![Content::text(format_failure(&error))])
            }
        }
    }

    /// Route a tool call by name.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
        cancel: &CancellationToken,
    ) -> CallToolResult {
        match name {
            TOOL_NAME => {
                let args = serde_json::Value::Object(arguments.unwrap_or_default());
                match serde_json::from_value::<GenerateImageToolParams>(args) {
                    Ok(params) => self.generate_image(params, cancel).await,
                    Err(e) => error_result(format!("Invalid parameters: {}", e)),
                }
            }
            _ => {
                warn!(tool = %name, "Unknown tool requested");
                error_result(format!("Unknown tool: {}", name))
            }
        }
    }

    fn tool() -> rmcp::model::Tool {
        use rmcp::model::Tool;
        use schemars::schema_for;

        let schema = schema_for!(GenerateImageToolParams);
        let schema_value = serde_json::to_value(&schema).unwrap_or_default();
        let input_schema = match schema_value {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        };

        Tool {
            name: Cow::Borrowed(TOOL_NAME),
            description: Some(Cow::Borrowed(
                "Generate an image from a text prompt, or edit an existing image by \
                 supplying it as imageBase64 together with a prompt describing the change. \
                 Returns the URL of the generated image.",
            )),
            input_schema,
            annotations: None,
            icons: None,
            meta: None,
            output_schema: None,
            title: None,
        }
    }
}

impl ServerHandler for ImageServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Image generation server. Use generateImage with a prompt to create an image, \
                 or pass imageBase64 as well to edit an existing image. \
                 Generation runs remotely and may take a minute or more."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server_name.clone(),
                version: self.config.server_version.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(rmcp::model::ListToolsResult {
                tools: vec![Self::tool()],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let cancel = context.ct.clone();
            Ok(self.dispatch(params.name.as_ref(), params.arguments, &cancel).await)
        }
    }
}
