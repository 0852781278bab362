// ABOUTME: Streamable HTTP transport routes: POST/GET/DELETE /mcp plus health probes
// ABOUTME: Initialize mints the session id; GET upgrades to SSE with Last-Event-ID replay
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

//! Streamable HTTP flavor
//!
//! One endpoint, three verbs. `POST /mcp` carries client→server envelopes
//! and answers requests in the response body; a fresh initialize (no session
//! header) mints a session whose id is returned in the `Mcp-Session-Id`
//! header only after the handshake succeeds. `GET /mcp` opens the
//! server→client read stream, replaying from the event store when the client
//! presents a `Last-Event-ID`. `DELETE /mcp` terminates the session.

use crate::constants::limits;
use crate::constants::protocol::{
    LAST_EVENT_ID_HEADER, MCP_SESSION_ID_HEADER, SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::jsonrpc::{error_codes, JsonRpcRequest, JSONRPC_VERSION};
use crate::mcp::request_processor::RequestProcessor;
use crate::mcp::resources::ServerResources;
use crate::middleware::{origin_gate, protocol_version_gate, setup_cors};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware as axum_middleware;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Streamable HTTP route handlers
pub struct StreamableHttpRoutes;

impl StreamableHttpRoutes {
    /// Build the router with the full edge middleware stack mounted
    pub fn router(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/mcp",
                post(Self::handle_post)
                    .get(Self::handle_get)
                    .delete(Self::handle_delete),
            )
            .route("/health", get(Self::handle_health))
            .route("/ready", get(Self::handle_ready))
            .layer(axum_middleware::from_fn_with_state(
                Arc::clone(&resources),
                protocol_version_gate,
            ))
            .layer(axum_middleware::from_fn_with_state(
                Arc::clone(&resources),
                origin_gate,
            ))
            .layer(setup_cors(&resources.config))
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(limits::MAX_BODY_BYTES))
            .with_state(resources)
    }

    /// Handle a client→server envelope
    async fn handle_post(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: String,
    ) -> Response {
        let value: Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(e) => {
                return envelope_error(
                    StatusCode::BAD_REQUEST,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {e}"),
                    None,
                );
            }
        };

        // A body without a method is a client response/ack; accept and drop.
        if value.get("method").is_none() {
            return StatusCode::ACCEPTED.into_response();
        }

        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                return envelope_error(
                    StatusCode::BAD_REQUEST,
                    error_codes::INVALID_REQUEST,
                    format!("Invalid Request: {e}"),
                    None,
                );
            }
        };

        let session_id = header_str(&headers, MCP_SESSION_ID_HEADER);

        if request.method == "initialize" {
            return Self::handle_initialize_post(&resources, session_id, request).await;
        }

        let Some(session_id) = session_id else {
            return envelope_error(
                StatusCode::BAD_REQUEST,
                error_codes::BAD_REQUEST,
                "Bad Request: No valid session ID provided",
                request.id,
            );
        };

        if resources.sessions.route(session_id).await.is_none() {
            // The write path treats a dead session as a caller mistake; the
            // read and terminate paths report not-found instead.
            return envelope_error(
                StatusCode::BAD_REQUEST,
                error_codes::SESSION_NOT_FOUND,
                "Bad Request: Session not found",
                request.id,
            );
        }

        let processor = RequestProcessor::new(Arc::clone(&resources));
        match processor.handle_request(request).await {
            Some(response) => (StatusCode::OK, Json(response)).into_response(),
            None => StatusCode::ACCEPTED.into_response(),
        }
    }

    /// Initialize handshake: create, dispatch, and only then register
    ///
    /// The session id is minted before dispatch but published to the caller
    /// (and the registry) only on success, so a routable-looking id that is
    /// not yet routable never escapes.
    async fn handle_initialize_post(
        resources: &Arc<ServerResources>,
        session_id: Option<&str>,
        request: JsonRpcRequest,
    ) -> Response {
        if session_id.is_some() {
            return envelope_error(
                StatusCode::BAD_REQUEST,
                error_codes::BAD_REQUEST,
                "Bad Request: Server already initialized",
                request.id,
            );
        }

        let transport = resources.sessions.create();
        let processor = RequestProcessor::new(Arc::clone(resources));

        match processor.handle_request(request).await {
            Some(response) if response.is_success() => {
                resources.sessions.activate(&transport).await;

                let mut http_response = (StatusCode::OK, Json(response)).into_response();
                if let Ok(header_value) = HeaderValue::from_str(transport.session_id()) {
                    http_response
                        .headers_mut()
                        .insert(MCP_SESSION_ID_HEADER, header_value);
                }
                info!(session_id = %transport.session_id(), "session initialized");
                http_response
            }
            Some(response) => {
                // Handshake refused: the transport is dropped unregistered.
                warn!("initialize handshake failed");
                let status = response.error.as_ref().map_or(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    |error| match error.code {
                        error_codes::INVALID_REQUEST | error_codes::INVALID_PARAMS => {
                            StatusCode::BAD_REQUEST
                        }
                        _ => StatusCode::INTERNAL_SERVER_ERROR,
                    },
                );
                (status, Json(response)).into_response()
            }
            None => StatusCode::ACCEPTED.into_response(),
        }
    }

    /// Open or resume the session's read stream
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Response {
        let Some(session_id) = header_str(&headers, MCP_SESSION_ID_HEADER) else {
            return envelope_error(
                StatusCode::BAD_REQUEST,
                error_codes::BAD_REQUEST,
                "Bad Request: Mcp-Session-Id header required",
                None,
            );
        };

        let Some(transport) = resources.sessions.route(session_id).await else {
            return envelope_error(
                StatusCode::NOT_FOUND,
                error_codes::SESSION_NOT_FOUND,
                "Session not found",
                None,
            );
        };

        // Subscribe before replaying so nothing appended in between is lost;
        // the sortable ids let the live loop drop anything already replayed.
        let mut live = transport.subscribe();
        let mut shutdown = transport.shutdown_signal();

        let replayed = match header_str(&headers, LAST_EVENT_ID_HEADER) {
            Some(last_event_id) => {
                let missed = transport.replay_missed(last_event_id).await;
                debug!(
                    session_id,
                    last_event_id,
                    replayed = missed.len(),
                    "resuming read stream"
                );
                missed
            }
            None => Vec::new(),
        };

        let stream = async_stream::stream! {
            let mut last_yielded = replayed.last().map(|event| event.event_id.clone());

            for event in replayed {
                yield Ok::<_, Infallible>(
                    Event::default()
                        .id(&event.event_id)
                        .event("message")
                        .data(&event.payload),
                );
            }

            loop {
                let received = tokio::select! {
                    changed = shutdown.changed() => {
                        match changed {
                            Ok(()) if !*shutdown.borrow() => continue,
                            _ => None,
                        }
                    }
                    received = live.recv() => Some(received),
                };

                let Some(received) = received else { break };

                match received {
                    Ok(event) => {
                        let already_sent = last_yielded
                            .as_deref()
                            .is_some_and(|last| event.event_id.as_str() <= last);
                        if already_sent {
                            continue;
                        }
                        last_yielded = Some(event.event_id.clone());
                        yield Ok(
                            Event::default()
                                .id(&event.event_id)
                                .event("message")
                                .data(&event.payload),
                        );
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "read stream lagged behind live delivery");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
    }

    /// Terminate a session
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Response {
        let Some(session_id) = header_str(&headers, MCP_SESSION_ID_HEADER) else {
            return envelope_error(
                StatusCode::BAD_REQUEST,
                error_codes::BAD_REQUEST,
                "Bad Request: Mcp-Session-Id header required",
                None,
            );
        };

        match resources.sessions.terminate(session_id).await {
            Ok(()) => (
                StatusCode::OK,
                Json(json!({
                    "status": "session terminated",
                    "session_id": session_id,
                })),
            )
                .into_response(),
            Err(e) => e.into_response(),
        }
    }

    /// Liveness probe
    async fn handle_health(State(resources): State<Arc<ServerResources>>) -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "transport": "streamable-http",
            "protocol_versions": SUPPORTED_PROTOCOL_VERSIONS,
            "active_sessions": resources.sessions.active_count().await,
            "uptime_seconds": resources.uptime_seconds(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }

    /// Readiness probe
    async fn handle_ready() -> Json<Value> {
        Json(json!({
            "status": "ready",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

/// Extract a header as a string slice
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Build a protocol-shaped error response
fn envelope_error(
    status: StatusCode,
    code: i32,
    message: impl Into<String>,
    id: Option<Value>,
) -> Response {
    let body = json!({
        "jsonrpc": JSONRPC_VERSION,
        "error": {
            "code": code,
            "message": message.into(),
        },
        "id": id.unwrap_or(Value::Null),
    });
    (status, Json(body)).into_response()
}
