// ABOUTME: Legacy SSE route handlers: the streaming connection, message ingress, health
// ABOUTME: Responses to posted messages travel over the SSE stream, not the POST body
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

use crate::constants::limits;
use crate::errors::AppError;
use crate::jsonrpc::{error_codes, JsonRpcRequest, JSONRPC_VERSION};
use crate::sse::manager::{LegacySseManager, SseFrame};
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{Stream, StreamExt};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::trace::TraceLayer;

/// Legacy SSE route handlers
pub struct LegacySseRoutes;

impl LegacySseRoutes {
    /// Build the legacy flavor router
    pub fn router(manager: Arc<LegacySseManager>) -> Router {
        Router::new()
            .route("/sse", get(Self::handle_sse))
            .route("/message", post(Self::handle_message))
            .route("/health", get(Self::handle_health))
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(limits::MAX_BODY_BYTES))
            .with_state(manager)
    }

    /// Open the single streaming connection
    async fn handle_sse(
        State(manager): State<Arc<LegacySseManager>>,
        connect_info: Option<ConnectInfo<SocketAddr>>,
    ) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
        let remote_addr = connect_info.map(|ConnectInfo(addr)| addr);
        let (client_id, receiver) = LegacySseManager::connect(&manager, remote_addr)?;

        let guard = ConnectionGuard {
            manager: Arc::clone(&manager),
            client_id,
        };

        // The guard moves into the closure and drops with the stream when the
        // client disconnects, running the shared cleanup path.
        let stream = UnboundedReceiverStream::new(receiver).map(move |frame| {
            let _guard = &guard;
            match frame {
                SseFrame::Event { name, data } => {
                    Ok::<_, Infallible>(Event::default().event(name).data(data))
                }
                SseFrame::KeepAlive => Ok(Event::default().comment("keepalive")),
            }
        });

        // Keep-alive frames come from the manager's sweeper, not axum
        Ok(Sse::new(stream))
    }

    /// Forward a message to the currently active transport
    async fn handle_message(
        State(manager): State<Arc<LegacySseManager>>,
        body: String,
    ) -> Response {
        let request: JsonRpcRequest = match serde_json::from_str(&body) {
            Ok(request) => request,
            Err(e) => {
                let envelope = json!({
                    "jsonrpc": JSONRPC_VERSION,
                    "error": {
                        "code": error_codes::PARSE_ERROR,
                        "message": format!("Parse error: {e}"),
                    },
                    "id": Value::Null,
                });
                return (StatusCode::BAD_REQUEST, Json(envelope)).into_response();
            }
        };

        match manager.handle_message(request).await {
            Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
            Err(e) => e.into_response(),
        }
    }

    /// Liveness probe for the legacy flavor
    async fn handle_health(State(manager): State<Arc<LegacySseManager>>) -> Json<Value> {
        Json(json!({
            "status": "healthy",
            "transport": "sse",
            "connected": manager.is_connected(),
            "active_connections": manager.active_connection_count(),
            "reconnect_attempts": manager.reconnect_attempts(),
            "last_client_id": manager.last_client_id(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

/// Runs the shared cleanup path when the response stream is dropped
struct ConnectionGuard {
    manager: Arc<LegacySseManager>,
    client_id: String,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.manager.cleanup(&self.client_id);
    }
}
