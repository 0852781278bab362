// ABOUTME: Stdio transport binding the protocol core to the process pipe
// ABOUTME: Exactly one implicit session; no session id, no recovery
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

use crate::errors::AppResult;
use crate::jsonrpc::JsonRpcRequest;
use crate::mcp::request_processor::RequestProcessor;
use crate::mcp::resources::ServerResources;
use crate::mcp::server::shutdown_signal;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Handles stdio transport for MCP communication
pub struct StdioTransport {
    resources: Arc<ServerResources>,
}

impl StdioTransport {
    /// Creates a new stdio transport instance
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Create a JSON-RPC parse error response
    fn parse_error_response() -> Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "error": {
                "code": -32700,
                "message": "Parse error"
            },
            "id": null
        })
    }

    /// Run the stdio transport until stdin closes or a signal arrives
    ///
    /// Each line is one JSON-RPC envelope; responses go to stdout. A parse
    /// failure answers with a parse-error envelope and keeps the loop alive.
    /// On an interrupt/termination signal the transport performs one
    /// best-effort flush and returns so the process exits cleanly.
    ///
    /// # Errors
    /// Returns an error if stdin reading or stdout writing fails
    pub async fn run(&self) -> AppResult<()> {
        let processor = RequestProcessor::new(Arc::clone(&self.resources));

        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();
        let stdout = Arc::new(Mutex::new(tokio::io::stdout()));

        info!("MCP stdio transport ready - listening on stdin/stdout");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            Self::process_line(&processor, &line, &stdout).await?;
                        }
                        None => {
                            info!("stdin closed, shutting down stdio transport");
                            break;
                        }
                    }
                }
                () = shutdown_signal() => {
                    info!("termination signal received, closing stdio transport");
                    break;
                }
            }
        }

        // Best-effort close
        let mut out = stdout.lock().await;
        out.flush().await?;
        drop(out);

        Ok(())
    }

    async fn process_line(
        processor: &RequestProcessor,
        line: &str,
        stdout: &Arc<Mutex<tokio::io::Stdout>>,
    ) -> AppResult<()> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => {
                if let Some(response) = processor.handle_request(request).await {
                    let payload = serde_json::to_value(&response)?;
                    Self::write_json(stdout, &payload).await?;
                }
            }
            Err(e) => {
                warn!("invalid JSON-RPC message: {e}");
                Self::write_json(stdout, &Self::parse_error_response()).await?;
            }
        }

        Ok(())
    }

    /// Write one newline-delimited JSON value to stdout
    async fn write_json(stdout: &Arc<Mutex<tokio::io::Stdout>>, value: &Value) -> AppResult<()> {
        let payload = serde_json::to_string(value)?;

        let mut out = stdout.lock().await;
        out.write_all(payload.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        drop(out);

        Ok(())
    }
}
