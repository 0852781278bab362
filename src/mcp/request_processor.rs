// ABOUTME: MCP request validation, routing, and dispatch against the tool registry
// ABOUTME: The protocol core seam every transport hands its envelopes to
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

use crate::errors::{AppError, AppResult};
use crate::jsonrpc::{error_codes, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use crate::mcp::resources::ServerResources;
use crate::tools::ToolError;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::constants::protocol;

/// Processes protocol requests with validation, routing, and execution
pub struct RequestProcessor {
    resources: Arc<ServerResources>,
}

impl RequestProcessor {
    /// Create a processor over the shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Handle a request and return a response, or `None` for notifications
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, id = ?request.id, "received request");

        if request.is_notification() || request.method.starts_with("notifications/") {
            Self::handle_notification(&request);
            return None;
        }

        let response = match self.process(&request).await {
            Ok(response) => response,
            Err(e) => Self::error_response(&request, &e),
        };

        Some(response)
    }

    async fn process(&self, request: &JsonRpcRequest) -> AppResult<JsonRpcResponse> {
        Self::validate(request)?;

        match request.method.as_str() {
            "initialize" => Ok(Self::handle_initialize(request)),
            "ping" => Ok(Self::handle_ping(request)),
            "tools/list" => Ok(self.handle_tools_list(request)),
            "tools/call" => Ok(self.handle_tools_call(request).await),
            _ => Ok(Self::handle_unknown_method(request)),
        }
    }

    /// Validate envelope format and required fields
    fn validate(request: &JsonRpcRequest) -> AppResult<()> {
        if request.jsonrpc != JSONRPC_VERSION {
            return Err(AppError::invalid_input(format!(
                "invalid JSON-RPC version: got '{}', expected '{JSONRPC_VERSION}'",
                request.jsonrpc
            )));
        }

        if request.method.is_empty() {
            return Err(AppError::invalid_input("missing method"));
        }

        Ok(())
    }

    /// Handshake: negotiate the protocol version and advertise capabilities
    ///
    /// A supported requested version is echoed back; anything else is
    /// answered with the latest version this server speaks.
    fn handle_initialize(request: &JsonRpcRequest) -> JsonRpcResponse {
        let requested = request
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        let negotiated = if protocol::is_supported_version(requested) {
            requested
        } else {
            protocol::LATEST_PROTOCOL_VERSION
        };

        JsonRpcResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": negotiated,
                "capabilities": {
                    "tools": { "listChanged": false },
                },
                "serverInfo": {
                    "name": protocol::SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            }),
        )
    }

    fn handle_ping(request: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(request.id.clone(), json!({}))
    }

    fn handle_tools_list(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let tools = self.resources.tools.descriptors();
        JsonRpcResponse::success(request.id.clone(), json!({ "tools": tools }))
    }

    /// Dispatch a tool call through the registry
    ///
    /// Protocol-level mistakes (missing name, unknown tool, bad arguments)
    /// are JSON-RPC errors; a tool that ran and failed reports through the
    /// `isError` result flag instead.
    async fn handle_tools_call(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
        let Some(params) = request.params.as_ref() else {
            return JsonRpcResponse::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                "missing parameters for tools/call",
            );
        };

        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                "missing tool name",
            );
        };

        let Some(tool) = self.resources.tools.get(name) else {
            warn!(tool = name, "tools/call for unknown tool");
            return JsonRpcResponse::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                format!("unknown tool: {name}"),
            );
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        match tool.call(arguments).await {
            Ok(result) => JsonRpcResponse::success(
                request.id.clone(),
                json!({
                    "content": [{ "type": "text", "text": result.to_string() }],
                    "isError": false,
                }),
            ),
            Err(ToolError::InvalidArguments(message)) => JsonRpcResponse::error(
                request.id.clone(),
                error_codes::INVALID_PARAMS,
                format!("invalid arguments for {name}: {message}"),
            ),
            Err(ToolError::Execution(message)) => {
                warn!(tool = name, error = %message, "tool execution failed");
                JsonRpcResponse::success(
                    request.id.clone(),
                    json!({
                        "content": [{ "type": "text", "text": message }],
                        "isError": true,
                    }),
                )
            }
        }
    }

    fn handle_unknown_method(request: &JsonRpcRequest) -> JsonRpcResponse {
        warn!(method = %request.method, "unknown method");
        JsonRpcResponse::error(
            request.id.clone(),
            error_codes::METHOD_NOT_FOUND,
            format!("Unknown method: {}", request.method),
        )
    }

    /// Notifications produce no response
    fn handle_notification(request: &JsonRpcRequest) {
        debug!(method = %request.method, "notification received");
    }

    /// Convert a dispatch failure into a generic error envelope
    ///
    /// The detailed error goes to the log; the caller sees only the generic
    /// message so internals never leak through the protocol surface.
    fn error_response(request: &JsonRpcRequest, e: &AppError) -> JsonRpcResponse {
        error!(
            method = %request.method,
            id = ?request.id,
            error = %e,
            "failed to process request"
        );

        let code = match e.code {
            crate::errors::ErrorCode::InvalidInput => error_codes::INVALID_REQUEST,
            _ => error_codes::INTERNAL_ERROR,
        };

        JsonRpcResponse::error(request.id.clone(), code, e.message.clone())
    }
}
