//! Server startup integration tests.
//!
//! Tests that the MCP server can be instantiated from environment-style
//! configuration and reports the configured identity.

use image_task_mcp_common::Config;
use rmcp::ServerHandler;
use std::collections::HashMap;

/// Build a configuration the way `Config::from_env` would see it.
fn config_from(vars: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_task_mcp::ImageServer;

    /// Test that ImageServer can be created and provides server info.
    #[test]
    fn test_image_server_startup() {
        let config = config_from(&[("API_KEY", "k")]);
        let server = ImageServer::new(config).unwrap();
        let info = server.get_info();

        assert!(info.instructions.is_some());
        let instructions = info.instructions.as_ref().unwrap().to_lowercase();
        assert!(
            instructions.contains("image"),
            "Server instructions should mention 'image'"
        );
        assert!(info.capabilities.tools.is_some(), "Tools capability should be enabled");
    }

    /// Test that the configured name and version are reported.
    #[test]
    fn test_server_identity_from_environment() {
        let config = config_from(&[
            ("API_KEY", "k"),
            ("SERVER_NAME", "my-images"),
            ("SERVER_VERSION", "9.9.9"),
        ]);
        let server = ImageServer::new(config).unwrap();
        let info = server.get_info();

        assert_eq!(info.server_info.name, "my-images");
        assert_eq!(info.server_info.version, "9.9.9");
    }

    /// Test that the default identity is used when nothing is configured.
    #[test]
    fn test_default_server_identity() {
        let config = config_from(&[("API_KEY", "k")]);
        let server = ImageServer::new(config).unwrap();
        let info = server.get_info();

        assert_eq!(info.server_info.name, "image-task-mcp");
        assert!(!info.server_info.version.is_empty());
    }

    /// Test that a missing API key prevents startup.
    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = Config::from_lookup(|_| None).unwrap_err();
        assert!(err.to_string().contains("API_KEY"));
    }
}
