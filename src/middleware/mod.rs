// ABOUTME: HTTP edge middleware: origin allow-listing, version gating, CORS
// ABOUTME: Wraps the streamable HTTP surface; rejections short-circuit before handler logic

//! Edge middleware for the HTTP surface

/// CORS configuration
pub mod cors;

/// Origin and protocol-version gates
pub mod gates;

pub use cors::setup_cors;
pub use gates::{origin_gate, protocol_version_gate};
