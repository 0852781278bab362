// ABOUTME: Request gates rejecting disallowed origins and unsupported protocol versions
// ABOUTME: Both reject with the protocol-shaped envelope before any handler logic runs
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

//! Origin and protocol-version gates
//!
//! The origin gate mitigates cross-origin and DNS-rebinding abuse of a
//! locally bound control port: a browser-supplied `Origin` header must
//! prefix-match one of the configured allow-list entries. Requests without
//! an `Origin` header (non-browser clients) pass untouched.
//!
//! The version gate applies to any request carrying a session id — i.e.
//! every non-initialize call. A present `Mcp-Protocol-Version` header must
//! equal one of the supported literals.

use crate::constants::protocol::{
    is_supported_version, MCP_PROTOCOL_VERSION_HEADER, MCP_SESSION_ID_HEADER,
    SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::errors::AppError;
use crate::mcp::resources::ServerResources;
use axum::extract::{Request, State};
use axum::http::header::ORIGIN;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::warn;

/// Reject requests whose declared origin is not in the allow-list
pub async fn origin_gate(
    State(resources): State<Arc<ServerResources>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(origin) = req.headers().get(ORIGIN).and_then(|v| v.to_str().ok()) {
        let allowed = resources
            .config
            .http
            .allowed_origins
            .iter()
            .any(|prefix| origin.starts_with(prefix.as_str()));

        if !allowed {
            warn!(origin, "rejected request from disallowed origin");
            return AppError::origin_forbidden(format!("origin not allowed: {origin}"))
                .into_response();
        }
    }

    next.run(req).await
}

/// Reject non-initialize requests declaring an unsupported protocol version
pub async fn protocol_version_gate(
    State(_resources): State<Arc<ServerResources>>,
    req: Request,
    next: Next,
) -> Response {
    // Initialize requests carry no session id and negotiate their own version.
    if req.headers().contains_key(MCP_SESSION_ID_HEADER) {
        if let Some(version) = req
            .headers()
            .get(MCP_PROTOCOL_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            if !is_supported_version(version) {
                warn!(version, "rejected request with unsupported protocol version");
                return AppError::version_mismatch(format!(
                    "Bad Request: Unsupported protocol version: {version} (supported: {})",
                    SUPPORTED_PROTOCOL_VERSIONS.join(", ")
                ))
                .into_response();
            }
        }
    }

    next.run(req).await
}
