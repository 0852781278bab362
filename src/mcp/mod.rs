// ABOUTME: Model Context Protocol transport and session layer
// ABOUTME: Hosts the event store, session registry, request dispatch, and transport bindings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

//! MCP transport and session layer

/// Replayable per-stream event log
pub mod event_store;

/// Protocol request validation and dispatch
pub mod request_processor;

/// Shared server resources passed by handle into request handlers
pub mod resources;

/// Transport selection and server lifecycle
pub mod server;

/// Session registry and streamable HTTP transport state
pub mod session;

/// Stdio transport binding
pub mod stdio;

/// Streamable HTTP routes
pub mod streamable_http;
