// ABOUTME: Server binary wiring configuration, logging, tools, and the selected transport
// ABOUTME: Exits 0 on graceful shutdown, 1 on startup or transport failure
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Relay MCP Server Binary
//!
//! Starts one transport flavor — stdio, legacy SSE, or streamable HTTP —
//! selected by `RELAY_TRANSPORT` (overridable on the command line), wired to
//! the built-in diagnostic tool registry.

use anyhow::Result;
use clap::Parser;
use relay_mcp_server::{
    config::environment::{ServerConfig, TransportFlavor},
    logging,
    mcp::{resources::ServerResources, server::McpServer},
    tools::builtin::{EchoTool, ServerStatusTool},
    tools::ToolRegistry,
};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "relay-mcp-server")]
#[command(about = "Relay MCP Server - session-aware MCP transport bindings")]
struct Args {
    /// Override the transport flavor (stdio | sse | streamable-http)
    #[arg(long)]
    transport: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(transport) = args.transport.as_deref() {
        config.transport = TransportFlavor::from_str_or_default(transport);
    }
    if let Some(http_port) = args.http_port {
        config.http.port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Relay MCP Server v{}", env!("CARGO_PKG_VERSION"));
    info!("{}", config.summary());

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    registry.register(Arc::new(ServerStatusTool::new(chrono::Utc::now())));
    info!("tool registry ready ({} tools)", registry.len());

    let resources = Arc::new(ServerResources::new(Arc::new(config), registry));
    let server = McpServer::new(resources);

    if let Err(e) = server.run().await {
        error!("server error: {e}");
        std::process::exit(1);
    }

    info!("shutdown complete");
    Ok(())
}
