// ABOUTME: Legacy SSE connection manager: single current transport, keep-alive, reconnect cycle
// ABOUTME: A new inbound connection deliberately replaces the previous one and resets the backoff

//! Legacy SSE connection management
//!
//! The legacy flavor carries at most one logical session per process. The
//! "current connection" slot makes that policy explicit: an inbound `/sse`
//! connection closes and replaces whatever held the slot before. All
//! connection loss paths — stream drop, keep-alive write failure, dispatch
//! write failure — converge on [`LegacySseManager::cleanup`].
//!
//! The reconnect cycle is passive. A handshake failure starts a bounded
//! backoff chain (`2000ms × 1.5^(attempt−1)`, capped at 10 attempts) that
//! only paces logging and re-arming; the server never dials out. Any
//! successful inbound connection resets the attempt counter.

use crate::errors::{AppError, AppResult};
use crate::jsonrpc::JsonRpcRequest;
use crate::mcp::request_processor::RequestProcessor;
use crate::mcp::resources::ServerResources;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::constants::limits::RECONNECT_BACKOFF_FACTOR;

/// One frame queued for delivery on the SSE response
#[derive(Debug)]
pub enum SseFrame {
    /// A named event with a data payload
    Event {
        /// SSE event name
        name: &'static str,
        /// Event data
        data: String,
    },
    /// A comment frame keeping the connection alive
    KeepAlive,
}

/// One inbound streaming connection
pub struct ActiveConnection {
    /// Random id assigned at connect time
    pub client_id: String,
    /// Peer address when known
    pub remote_addr: Option<SocketAddr>,
    /// When the connection was accepted
    pub connected_at: DateTime<Utc>,
    sender: mpsc::UnboundedSender<SseFrame>,
}

impl ActiveConnection {
    fn send(&self, frame: SseFrame) -> bool {
        self.sender.send(frame).is_ok()
    }
}

#[derive(Debug, Default)]
struct ReconnectState {
    attempts: u32,
    last_client_id: Option<String>,
}

/// Process-wide manager for the legacy SSE flavor
pub struct LegacySseManager {
    resources: Arc<ServerResources>,
    connections: DashMap<String, ActiveConnection>,
    current: RwLock<Option<String>>,
    reconnect: Mutex<ReconnectState>,
}

impl LegacySseManager {
    /// Create the manager over shared resources
    #[must_use]
    pub fn new(resources: Arc<ServerResources>) -> Self {
        Self {
            resources,
            connections: DashMap::new(),
            current: RwLock::new(None),
            reconnect: Mutex::new(ReconnectState::default()),
        }
    }

    /// Accept an inbound streaming connection
    ///
    /// Assigns a random client id, replaces the current connection, resets
    /// the reconnect counter, and performs the handshake (the initial
    /// `endpoint` event). A handshake failure triggers the reconnect cycle.
    ///
    /// # Errors
    /// Returns an error if the handshake frame cannot be delivered
    pub fn connect(
        manager: &Arc<Self>,
        remote_addr: Option<SocketAddr>,
    ) -> AppResult<(String, mpsc::UnboundedReceiver<SseFrame>)> {
        let client_id = format!("client-{:08x}", rand::random::<u32>());
        let (sender, receiver) = mpsc::unbounded_channel();

        // Explicit replace rule: the newcomer owns the slot, the predecessor
        // is closed by dropping its sender.
        let previous = {
            let mut current = manager
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            current.replace(client_id.clone())
        };
        if let Some(old_id) = previous {
            if manager.connections.remove(&old_id).is_some() {
                info!(old_id, "replacing active SSE connection");
            }
        }

        manager.connections.insert(
            client_id.clone(),
            ActiveConnection {
                client_id: client_id.clone(),
                remote_addr,
                connected_at: Utc::now(),
                sender: sender.clone(),
            },
        );

        // An inbound connection resets the backoff cycle
        {
            let mut state = manager
                .reconnect
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.attempts = 0;
            state.last_client_id = Some(client_id.clone());
        }

        // Handshake: advertise the message endpoint on the stream
        let endpoint = format!("/message?clientId={client_id}");
        let handshake = SseFrame::Event {
            name: "endpoint",
            data: endpoint,
        };
        if sender.send(handshake).is_err() {
            manager.cleanup(&client_id);
            Self::schedule_reconnect(manager);
            return Err(AppError::internal(
                "SSE handshake failed: client channel closed",
            ));
        }

        info!(client_id, ?remote_addr, "SSE connection established");
        Ok((client_id, receiver))
    }

    /// Start the bounded backoff cycle after a connection failure
    ///
    /// Each link of the chain sleeps the computed delay and re-arms only if
    /// no client reconnected meanwhile. Past the attempt cap the cycle logs
    /// and gives up; the next inbound connection starts a fresh sequence.
    pub fn schedule_reconnect(manager: &Arc<Self>) {
        let max_attempts = manager.resources.config.sse.max_reconnect_attempts;
        let attempt = {
            let mut state = manager
                .reconnect
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if state.attempts >= max_attempts {
                None
            } else {
                state.attempts += 1;
                Some(state.attempts)
            }
        };

        let Some(attempt) = attempt else {
            error!(
                "giving up after {max_attempts} reconnect attempts; awaiting inbound connection"
            );
            return;
        };

        let base = manager.resources.config.sse.reconnect_base_delay_ms as f64;
        let delay_ms = base * RECONNECT_BACKOFF_FACTOR.powi(attempt as i32 - 1);
        let delay = Duration::from_millis(delay_ms as u64);
        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            "SSE connection lost, backing off"
        );

        let manager = Arc::clone(manager);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if manager.is_connected() {
                info!("client reconnected, ending backoff cycle");
            } else {
                Self::schedule_reconnect(&manager);
            }
        });
    }

    /// Single convergence point for every connection loss path
    pub fn cleanup(&self, client_id: &str) {
        self.connections.remove(client_id);

        {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if current.as_deref() == Some(client_id) {
                *current = None;
            }
        }

        // A fresh inbound connection starts a fresh backoff sequence
        {
            let mut state = self
                .reconnect
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.attempts = 0;
        }

        info!(client_id, "SSE connection closed");
    }

    /// Forward an inbound message to the current transport
    ///
    /// The dispatch response is delivered over the SSE stream; the POST
    /// itself only acknowledges acceptance.
    ///
    /// # Errors
    /// Returns a service-unavailable error when no connection is current,
    /// or when the current connection dies mid-dispatch
    pub async fn handle_message(&self, request: JsonRpcRequest) -> AppResult<()> {
        let client_id = {
            let current = self
                .current
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            current.clone()
        }
        .ok_or_else(|| AppError::transport_unavailable("SSE connection not established"))?;

        let processor = RequestProcessor::new(Arc::clone(&self.resources));
        if let Some(response) = processor.handle_request(request).await {
            let payload = serde_json::to_string(&response)?;
            let delivered = self.connections.get(&client_id).is_some_and(|connection| {
                connection.send(SseFrame::Event {
                    name: "message",
                    data: payload,
                })
            });

            if !delivered {
                self.cleanup(&client_id);
                return Err(AppError::transport_unavailable(
                    "SSE connection lost during dispatch",
                ));
            }
        }

        Ok(())
    }

    /// One keep-alive pass over every active connection
    ///
    /// A write failure marks only that connection down; delivery to the
    /// others is unaffected.
    pub fn keepalive_sweep(&self) {
        let mut failed = Vec::new();
        for connection in &self.connections {
            if !connection.send(SseFrame::KeepAlive) {
                failed.push(connection.key().clone());
            }
        }

        for client_id in failed {
            warn!(client_id, "keep-alive write failed, pruning connection");
            self.cleanup(&client_id);
        }
    }

    /// Spawn the periodic keep-alive sweeper
    pub fn spawn_keepalive(manager: &Arc<Self>) {
        let manager = Arc::clone(manager);
        let interval = Duration::from_secs(manager.resources.config.sse.keepalive_interval_secs);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it so sweeps start one
            // full interval after startup.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager.keepalive_sweep();
            }
        });
    }

    /// Whether a connection currently holds the slot
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of entries in the active-connection collection
    #[must_use]
    pub fn active_connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Current reconnect attempt counter
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .attempts
    }

    /// Client id of the most recent connection, if any
    #[must_use]
    pub fn last_client_id(&self) -> Option<String> {
        self.reconnect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_client_id
            .clone()
    }
}
