// ABOUTME: Shared helpers for integration tests
// ABOUTME: Builds server resources with the built-in diagnostic tool registry

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(dead_code)]

use relay_mcp_server::config::environment::ServerConfig;
use relay_mcp_server::mcp::resources::ServerResources;
use relay_mcp_server::tools::builtin::{EchoTool, ServerStatusTool};
use relay_mcp_server::tools::ToolRegistry;
use std::sync::Arc;

/// Build resources over the default configuration and built-in tools
pub fn test_resources() -> Arc<ServerResources> {
    test_resources_with_config(ServerConfig::default())
}

/// Build resources over a specific configuration
pub fn test_resources_with_config(config: ServerConfig) -> Arc<ServerResources> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    registry.register(Arc::new(ServerStatusTool::new(chrono::Utc::now())));

    Arc::new(ServerResources::new(Arc::new(config), registry))
}
