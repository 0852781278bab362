// ABOUTME: End-to-end tests for the streamable HTTP flavor through the full router
// ABOUTME: Covers session minting, routing failures, termination, and the edge gates

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use relay_mcp_server::mcp::streamable_http::StreamableHttpRoutes;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

fn app() -> Router {
    StreamableHttpRoutes::router(common::test_resources())
}

fn post_mcp(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_mcp_with_session(body: &Value, session_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .header("mcp-session-id", session_id)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn initialize_body(id: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "initialize",
        "params": { "protocolVersion": "2025-06-18" },
        "id": id,
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Initialize with no session id mints a fresh session id header
#[tokio::test]
async fn test_initialize_mints_session_id() {
    let app = app();

    let response = app.oneshot(post_mcp(&initialize_body(1))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let session_id = response
        .headers()
        .get("mcp-session-id")
        .expect("initialize response must carry a session id")
        .to_str()
        .unwrap()
        .to_owned();
    assert!(!session_id.is_empty());

    let body = body_json(response).await;
    assert_eq!(body["result"]["protocolVersion"], "2025-06-18");
}

/// Two initializations never yield the same session id
#[tokio::test]
async fn test_initialize_ids_are_unique() {
    let app = app();

    let first = app.clone().oneshot(post_mcp(&initialize_body(1))).await.unwrap();
    let second = app.oneshot(post_mcp(&initialize_body(2))).await.unwrap();

    let id_of = |response: &axum::response::Response| {
        response
            .headers()
            .get("mcp-session-id")
            .unwrap()
            .to_str()
            .unwrap()
            .to_owned()
    };

    assert_ne!(id_of(&first), id_of(&second));
}

/// A non-initialize request without a session id is a bad request
#[tokio::test]
async fn test_missing_session_is_bad_request() {
    let app = app();

    let body = json!({ "jsonrpc": "2.0", "method": "tools/list", "id": 1 });
    let response = app.oneshot(post_mcp(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!(-32000));
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("No valid session ID provided"));
}

/// An unknown session id on the write path is a bad request
#[tokio::test]
async fn test_unknown_session_is_rejected() {
    let app = app();

    let body = json!({ "jsonrpc": "2.0", "method": "tools/list", "id": 1 });
    let response = app
        .oneshot(post_mcp_with_session(&body, "no-such-session"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!(-32001));
}

/// Unparseable bodies answer with a parse-error envelope
#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!(-32700));
}

/// The full session lifecycle: initialize, use, terminate, reject
#[tokio::test]
async fn test_full_session_lifecycle() {
    let app = app();

    // Initialize
    let response = app.clone().oneshot(post_mcp(&initialize_body(1))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = response
        .headers()
        .get("mcp-session-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();

    // tools/list against the live session
    let list = json!({ "jsonrpc": "2.0", "method": "tools/list", "id": 2 });
    let response = app
        .clone()
        .oneshot(post_mcp_with_session(&list, &session_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["result"]["tools"].as_array().unwrap().len() >= 2);

    // Terminate
    let delete = Request::builder()
        .method("DELETE")
        .uri("/mcp")
        .header("mcp-session-id", &session_id)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "session terminated");

    // The session is gone
    let response = app
        .oneshot(post_mcp_with_session(&list, &session_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// DELETE without a session header is distinct from an unknown id
#[tokio::test]
async fn test_delete_error_shapes() {
    let app = app();

    let no_header = Request::builder()
        .method("DELETE")
        .uri("/mcp")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(no_header).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown = Request::builder()
        .method("DELETE")
        .uri("/mcp")
        .header("mcp-session-id", "no-such-session")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(unknown).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// GET with a live session upgrades to an event stream
#[tokio::test]
async fn test_get_upgrades_to_event_stream() {
    let app = app();

    let response = app.clone().oneshot(post_mcp(&initialize_body(1))).await.unwrap();
    let session_id = response
        .headers()
        .get("mcp-session-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();

    let get = Request::builder()
        .method("GET")
        .uri("/mcp")
        .header("mcp-session-id", &session_id)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(get).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    // Without a session header the read path is a bad request
    let get = Request::builder()
        .method("GET")
        .uri("/mcp")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(get).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// A disallowed origin is rejected before any handler logic runs
#[tokio::test]
async fn test_forbidden_origin_short_circuits() {
    let resources = common::test_resources();
    let app = StreamableHttpRoutes::router(std::sync::Arc::clone(&resources));

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .header("origin", "http://evil.example.com")
        .body(Body::from(initialize_body(1).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!(-32003));

    // No session was created: the handler never ran
    assert_eq!(resources.sessions.active_count().await, 0);
}

/// An allow-listed origin passes the gate
#[tokio::test]
async fn test_allowed_origin_passes() {
    let app = app();

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .header("origin", "http://localhost:3000")
        .body(Body::from(initialize_body(1).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// An unsupported protocol version header fails closed on session requests
#[tokio::test]
async fn test_version_gate() {
    let app = app();

    let body = json!({ "jsonrpc": "2.0", "method": "tools/list", "id": 1 });

    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .header("mcp-session-id", "any-session")
        .header("mcp-protocol-version", "1999-01-01")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let rendered = body_json(response).await;
    assert!(rendered["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Unsupported protocol version"));

    // A supported version clears the gate (and then fails on the bogus session)
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .header("mcp-session-id", "any-session")
        .header("mcp-protocol-version", "2025-06-18")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let rendered = body_json(response).await;
    assert_eq!(rendered["error"]["code"], json!(-32001));
}

/// The health probe reports flavor, versions, sessions, and uptime
#[tokio::test]
async fn test_health_probe() {
    let app = app();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["transport"], "streamable-http");
    assert_eq!(body["active_sessions"], json!(0));
    assert!(body["protocol_versions"].as_array().unwrap().len() == 2);
    assert!(body["uptime_seconds"].as_i64().unwrap() >= 0);
}

/// Notifications on the write path are accepted without a body
#[tokio::test]
async fn test_notification_returns_accepted() {
    let app = app();

    let response = app.clone().oneshot(post_mcp(&initialize_body(1))).await.unwrap();
    let session_id = response
        .headers()
        .get("mcp-session-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();

    let notification = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" });
    let response = app
        .oneshot(post_mcp_with_session(&notification, &session_id))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}
