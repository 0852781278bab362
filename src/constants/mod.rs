// ABOUTME: Application constants for protocol versions, header names, and runtime limits
// ABOUTME: Single source of truth for every literal shared across transports
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

//! Application constants

/// MCP protocol constants and header names
pub mod protocol {
    /// Protocol versions accepted by the version gate, oldest first
    pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 2] = ["2025-03-26", "2025-06-18"];

    /// Version offered when the client requests an unsupported one
    pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

    /// Server name advertised in the initialize response
    pub const SERVER_NAME: &str = "relay-mcp-server";

    /// Header carrying the session id on the streamable HTTP flavor
    pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

    /// Header carrying the negotiated protocol version
    pub const MCP_PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";

    /// Header carrying the last acknowledged event id for replay
    pub const LAST_EVENT_ID_HEADER: &str = "last-event-id";

    /// Whether a protocol version string is supported
    #[must_use]
    pub fn is_supported_version(version: &str) -> bool {
        SUPPORTED_PROTOCOL_VERSIONS.contains(&version)
    }
}

/// Runtime limits and tunables
pub mod limits {
    /// Maximum accepted HTTP request body size (10 MB)
    pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

    /// Interval between keep-alive sweeps on the legacy SSE flavor
    pub const KEEPALIVE_INTERVAL_SECS: u64 = 30;

    /// Base delay of the legacy reconnect backoff
    pub const RECONNECT_BASE_DELAY_MS: u64 = 2000;

    /// Multiplier applied per reconnect attempt
    pub const RECONNECT_BACKOFF_FACTOR: f64 = 1.5;

    /// Reconnect attempts before the cycle gives up
    pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

    /// Default per-stream capacity of the event store
    pub const DEFAULT_EVENT_STORE_CAPACITY: usize = 1024;

    /// Buffer size of each session's live broadcast channel
    pub const SESSION_EVENT_BUFFER: usize = 256;
}

#[cfg(test)]
mod tests {
    use super::protocol;

    #[test]
    fn test_supported_versions() {
        assert!(protocol::is_supported_version("2025-06-18"));
        assert!(protocol::is_supported_version("2025-03-26"));
        assert!(!protocol::is_supported_version("2024-11-05"));
        assert!(!protocol::is_supported_version(""));
    }

    #[test]
    fn test_latest_version_is_supported() {
        assert!(protocol::is_supported_version(protocol::LATEST_PROTOCOL_VERSION));
    }
}
