// ABOUTME: Main library entry point for the Relay MCP transport server
// ABOUTME: Provides stdio, legacy SSE, and streamable HTTP bindings for MCP tool dispatch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Relay Tools

#![deny(unsafe_code)]

//! # Relay MCP Server
//!
//! A Model Context Protocol (MCP) server focused on the transport and session
//! layer: routing JSON-RPC messages to the correct logical session, keeping a
//! replayable per-session event log so a dropped connection can resume without
//! loss, and gating the HTTP surface against cross-origin and
//! version-mismatch abuse.
//!
//! Three interchangeable transport flavors are provided:
//!
//! - **stdio** — one implicit local session over the process pipe
//! - **sse** — the legacy HTTP+SSE flavor: a single streaming connection with
//!   keep-alive sweeps and a bounded reconnect/backoff cycle
//! - **streamable-http** — session-aware `POST`/`GET`/`DELETE /mcp` with
//!   `Last-Event-ID` replay-then-resume recovery
//!
//! Tool handlers are registered into a [`tools::ToolRegistry`] and dispatched
//! uniformly; their business semantics live outside this crate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_mcp_server::config::environment::ServerConfig;
//! use relay_mcp_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Relay MCP Server configured: {}", config.summary());
//!     Ok(())
//! }
//! ```

/// Environment-based configuration management
pub mod config;

/// Application constants: protocol versions, header names, limits
pub mod constants;

/// Unified error handling with protocol-shaped HTTP responses
pub mod errors;

/// Unified JSON-RPC 2.0 foundation shared by every transport
pub mod jsonrpc;

/// Structured logging bootstrap
pub mod logging;

/// Model Context Protocol transports, sessions, and dispatch
pub mod mcp;

/// HTTP edge middleware: origin gate, version gate, CORS
pub mod middleware;

/// Legacy single-session SSE transport flavor
pub mod sse;

/// Tool registry and built-in diagnostic tools
pub mod tools;
