// ABOUTME: Legacy HTTP+SSE transport flavor with a single active streaming connection
// ABOUTME: Independent of the session registry; one implicit session per process

//! Legacy SSE transport flavor

/// Connection manager: current slot, keep-alive, reconnect backoff
pub mod manager;

/// HTTP routes: /sse, /message, /health
pub mod routes;

pub use manager::{LegacySseManager, SseFrame};
