// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, transport selection, and runtime tunables
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based configuration management
//!
//! Configuration is environment-only: every knob is an environment variable
//! with a sensible default, so the same binary runs unchanged in local
//! development and containerized deployments.

use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Transport flavor selected at startup
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TransportFlavor {
    /// Single implicit session over the process stdin/stdout pipe
    Stdio,
    /// Legacy HTTP+SSE flavor: one streaming connection plus a message POST
    Sse,
    /// Session-aware streamable HTTP with reconnection recovery
    #[default]
    StreamableHttp,
}

impl TransportFlavor {
    /// Parse from string with fallback to the default flavor
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "stdio" => Self::Stdio,
            "sse" => Self::Sse,
            _ => Self::StreamableHttp,
        }
    }
}

impl std::fmt::Display for TransportFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Sse => write!(f, "sse"),
            Self::StreamableHttp => write!(f, "streamable-http"),
        }
    }
}

/// HTTP surface configuration (shared by both HTTP flavors)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port the HTTP listener binds to
    pub port: u16,
    /// Origin allow-list checked by prefix match; empty list disables the gate
    pub allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            allowed_origins: vec![
                "http://localhost".into(),
                "http://127.0.0.1".into(),
                "https://localhost".into(),
            ],
        }
    }
}

/// Legacy SSE flavor tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SseConfig {
    /// Seconds between keep-alive sweeps over the active connections
    pub keepalive_interval_secs: u64,
    /// Reconnect attempts before the backoff cycle gives up
    pub max_reconnect_attempts: u32,
    /// Base delay of the reconnect backoff in milliseconds
    pub reconnect_base_delay_ms: u64,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_secs: limits::KEEPALIVE_INTERVAL_SECS,
            max_reconnect_attempts: limits::MAX_RECONNECT_ATTEMPTS,
            reconnect_base_delay_ms: limits::RECONNECT_BASE_DELAY_MS,
        }
    }
}

/// Event store tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventStoreConfig {
    /// Events retained per stream before the oldest is evicted
    pub capacity_per_stream: usize,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            capacity_per_stream: limits::DEFAULT_EVENT_STORE_CAPACITY,
        }
    }
}

/// Complete server configuration loaded from the environment
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Selected transport flavor
    pub transport: TransportFlavor,
    /// HTTP surface settings
    pub http: HttpConfig,
    /// Legacy SSE settings
    pub sse: SseConfig,
    /// Event store settings
    pub event_store: EventStoreConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns a configuration error if a variable is present but unparseable
    pub fn from_env() -> AppResult<Self> {
        let transport = env::var("RELAY_TRANSPORT")
            .map(|s| TransportFlavor::from_str_or_default(&s))
            .unwrap_or_default();

        let port = parse_env_or("HTTP_PORT", 8080)?;

        let allowed_origins = env::var("RELAY_ALLOWED_ORIGINS").map_or_else(
            |_| HttpConfig::default().allowed_origins,
            |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            },
        );

        let event_store = EventStoreConfig {
            capacity_per_stream: parse_env_or(
                "RELAY_EVENT_STORE_CAPACITY",
                limits::DEFAULT_EVENT_STORE_CAPACITY,
            )?,
        };

        let sse = SseConfig {
            keepalive_interval_secs: parse_env_or(
                "RELAY_SSE_KEEPALIVE_SECS",
                limits::KEEPALIVE_INTERVAL_SECS,
            )?,
            max_reconnect_attempts: parse_env_or(
                "RELAY_SSE_MAX_RECONNECT_ATTEMPTS",
                limits::MAX_RECONNECT_ATTEMPTS,
            )?,
            reconnect_base_delay_ms: parse_env_or(
                "RELAY_SSE_RECONNECT_BASE_DELAY_MS",
                limits::RECONNECT_BASE_DELAY_MS,
            )?,
        };

        Ok(Self {
            transport,
            http: HttpConfig {
                port,
                allowed_origins,
            },
            sse,
            event_store,
        })
    }

    /// One-line configuration summary for startup logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "transport={} http_port={} allowed_origins={} event_store_capacity={}",
            self.transport,
            self.http.port,
            self.http.allowed_origins.len(),
            self.event_store.capacity_per_stream
        )
    }
}

/// Parse an environment variable, falling back to a default when unset
fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::config(format!("invalid value for {key}: {raw}"))),
        Err(_) => Ok(default),
    }
}
