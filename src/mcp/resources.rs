// ABOUTME: Shared server resources bundling config, tools, event store, and sessions
// ABOUTME: Owned by the entrypoint and passed by Arc handle into every request handler
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

use crate::config::environment::ServerConfig;
use crate::mcp::event_store::EventStore;
use crate::mcp::session::SessionRegistry;
use crate::tools::ToolRegistry;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Process-wide resources shared across transports
///
/// Replaces the module-level globals of older designs: every registry is an
/// explicit struct reachable only through this handle, which keeps the shared
/// state visible and testable.
pub struct ServerResources {
    /// Server configuration loaded at startup
    pub config: Arc<ServerConfig>,
    /// Registry of dispatchable tools
    pub tools: Arc<ToolRegistry>,
    /// Replayable event log shared by all sessions
    pub event_store: Arc<EventStore>,
    /// Session registry for the streamable HTTP flavor
    pub sessions: Arc<SessionRegistry>,
    /// Process start time for uptime reporting
    pub started_at: DateTime<Utc>,
}

impl ServerResources {
    /// Create the resource bundle from configuration and a tool registry
    #[must_use]
    pub fn new(config: Arc<ServerConfig>, tools: ToolRegistry) -> Self {
        let event_store = Arc::new(EventStore::new(config.event_store.capacity_per_stream));
        let sessions = Arc::new(SessionRegistry::new(Arc::clone(&event_store)));

        Self {
            config,
            tools: Arc::new(tools),
            event_store,
            sessions,
            started_at: Utc::now(),
        }
    }

    /// Seconds elapsed since the server started
    #[must_use]
    pub fn uptime_seconds(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}
