// ABOUTME: Session registry and per-session streamable HTTP transport state
// ABOUTME: Sessions become routable only after the initialize handshake is acknowledged
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

//! Session management for the streamable HTTP flavor
//!
//! A [`SessionTransport`] is created in `Initializing` state when an
//! initialize request arrives without a session id. It is inserted into the
//! [`SessionRegistry`] — and thereby becomes routable — only once the
//! protocol core has acknowledged the handshake. Lifecycle is an explicit
//! state machine (`Initializing → Active → Closed`), not callback fields.
//!
//! There is no idle eviction: a session lives until it is terminated or its
//! transport closes. Long-held sessions are a known resource cost; see
//! DESIGN.md.

use crate::errors::{AppError, AppResult};
use crate::mcp::event_store::EventStore;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::constants::limits;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created; handshake not yet acknowledged; not routable
    Initializing,
    /// Handshake acknowledged and registered; accepts requests
    Active,
    /// Terminated or transport-closed; never routable again
    Closed,
}

/// One message queued for delivery on a session's read stream
#[derive(Debug, Clone)]
pub struct OutboundEvent {
    /// Sortable event id from the event store
    pub event_id: String,
    /// Serialized protocol message
    pub payload: String,
}

/// Per-session transport bridging HTTP exchanges and protocol messages
pub struct SessionTransport {
    session_id: String,
    created_at: DateTime<Utc>,
    state: RwLock<SessionState>,
    events: Arc<EventStore>,
    live: broadcast::Sender<OutboundEvent>,
    shutdown: watch::Sender<bool>,
}

impl SessionTransport {
    fn new(events: Arc<EventStore>) -> Self {
        let (live, _) = broadcast::channel(limits::SESSION_EVENT_BUFFER);
        let (shutdown, _) = watch::channel(false);

        Self {
            session_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            state: RwLock::new(SessionState::Initializing),
            events,
            live,
            shutdown,
        }
    }

    /// The opaque session id
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// When the session was created
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        *self.state.read().await
    }

    pub(crate) async fn mark_active(&self) {
        let mut state = self.state.write().await;
        if *state == SessionState::Initializing {
            *state = SessionState::Active;
        }
    }

    /// Drive the transport to `Closed` and wake any live read streams
    pub async fn close(&self) {
        {
            let mut state = self.state.write().await;
            *state = SessionState::Closed;
        }
        let _ = self.shutdown.send(true);
        debug!(session_id = %self.session_id, "session transport closed");
    }

    /// Subscribe to live outbound delivery
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundEvent> {
        self.live.subscribe()
    }

    /// Watch receiver that flips to `true` when the transport closes
    #[must_use]
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Send a server-initiated message to this session
    ///
    /// The message is appended to the event store first and only then
    /// forwarded to any live read stream, so a client that reconnects with
    /// `Last-Event-ID` never misses it.
    ///
    /// # Errors
    /// Returns an error if the transport is already closed
    pub async fn send(&self, message: &Value) -> AppResult<String> {
        if self.state().await == SessionState::Closed {
            return Err(AppError::transport_unavailable(format!(
                "session {} is closed",
                self.session_id
            )));
        }

        let event_id = self.events.append(&self.session_id, message.clone()).await;
        let _ = self.live.send(OutboundEvent {
            event_id: event_id.clone(),
            payload: message.to_string(),
        });

        Ok(event_id)
    }

    /// Replay events this session's client missed after `last_event_id`
    ///
    /// Yields nothing when the id is unknown or belongs to another stream:
    /// replay never leaks events across sessions.
    pub async fn replay_missed(&self, last_event_id: &str) -> Vec<OutboundEvent> {
        let mut missed = Vec::new();
        let owner = self
            .events
            .replay_after(last_event_id, |event_id, message| {
                missed.push(OutboundEvent {
                    event_id: event_id.to_owned(),
                    payload: message.to_string(),
                });
            })
            .await;

        match owner {
            Some(stream_id) if stream_id == self.session_id => missed,
            _ => Vec::new(),
        }
    }
}

/// Registry mapping session ids to their active transports
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionTransport>>>,
    events: Arc<EventStore>,
}

impl SessionRegistry {
    /// Create a registry backed by the shared event store
    #[must_use]
    pub fn new(events: Arc<EventStore>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Create a transport in `Initializing` state, not yet routable
    #[must_use]
    pub fn create(&self) -> Arc<SessionTransport> {
        Arc::new(SessionTransport::new(Arc::clone(&self.events)))
    }

    /// Register a transport whose handshake has been acknowledged
    ///
    /// The activate-then-insert sequence runs under one write lock so the id
    /// is never observable in a half-registered state.
    pub async fn activate(&self, transport: &Arc<SessionTransport>) {
        let mut sessions = self.sessions.write().await;
        transport.mark_active().await;
        sessions.insert(transport.session_id().to_owned(), Arc::clone(transport));
        info!(session_id = %transport.session_id(), "session registered");
    }

    /// Look up the transport for an active session
    pub async fn route(&self, session_id: &str) -> Option<Arc<SessionTransport>> {
        let transport = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        }?;

        (transport.state().await == SessionState::Active).then_some(transport)
    }

    /// Terminate a session: close its transport, drop its stream, unregister
    ///
    /// # Errors
    /// Returns a not-found error when the id is unknown or already terminated
    pub async fn terminate(&self, session_id: &str) -> AppResult<()> {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_id)
        };

        match removed {
            Some(transport) => {
                transport.close().await;
                self.events.drop_stream(session_id).await;
                info!(session_id, "session terminated");
                Ok(())
            }
            None => Err(AppError::session_not_found(format!(
                "session {session_id} not found"
            ))),
        }
    }

    /// Number of registered sessions
    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
