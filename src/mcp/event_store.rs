// ABOUTME: Append-only per-stream event log used to replay missed messages after reconnect
// ABOUTME: Event ids encode the owning stream so recovery needs no side lookup table
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Relay Tools

//! Replayable event log
//!
//! Each session owns one stream in the store. Event ids have the form
//! `"{stream_id}_{seq:016x}"`: the zero-padded per-stream sequence number
//! makes lexicographic order equal append order at any magnitude, and the
//! embedded stream id lets [`EventStore::replay_after`] recover the owning
//! stream from the id alone.
//!
//! The log is bounded: each stream retains at most the configured capacity,
//! evicting oldest-first. An evicted (or never-seen) event id behaves as
//! unknown on replay.

use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

/// One stored protocol message
#[derive(Debug, Clone)]
pub struct StoredEvent {
    /// Sortable id encoding the owning stream and sequence number
    pub event_id: String,
    /// The protocol message payload
    pub message: Value,
}

/// Per-stream log state
struct StreamLog {
    next_seq: u64,
    events: VecDeque<StoredEvent>,
}

impl StreamLog {
    const fn new() -> Self {
        Self {
            next_seq: 0,
            events: VecDeque::new(),
        }
    }
}

/// Bounded, append-only event store keyed by stream
pub struct EventStore {
    capacity_per_stream: usize,
    streams: RwLock<HashMap<String, StreamLog>>,
}

impl EventStore {
    /// Create a store retaining `capacity_per_stream` events per stream
    #[must_use]
    pub fn new(capacity_per_stream: usize) -> Self {
        Self {
            capacity_per_stream,
            streams: RwLock::new(HashMap::new()),
        }
    }

    /// Append a message to a stream and return its event id
    ///
    /// Sequence allocation and insertion happen under one write lock, so ids
    /// within a stream are strictly monotonic even under concurrent appends.
    pub async fn append(&self, stream_id: &str, message: Value) -> String {
        let mut streams = self.streams.write().await;
        let log = streams
            .entry(stream_id.to_owned())
            .or_insert_with(StreamLog::new);

        let event_id = format!("{stream_id}_{:016x}", log.next_seq);
        log.next_seq += 1;
        log.events.push_back(StoredEvent {
            event_id: event_id.clone(),
            message,
        });

        if log.events.len() > self.capacity_per_stream {
            let evicted = log.events.pop_front();
            debug!(
                stream_id,
                evicted = evicted.as_ref().map(|e| e.event_id.as_str()),
                "event store capacity reached, evicting oldest"
            );
        }

        event_id
    }

    /// Extract the owning stream id from an event id
    ///
    /// The sequence suffix never contains an underscore, so splitting on the
    /// last one is unambiguous for any stream id.
    #[must_use]
    pub fn owner_of(event_id: &str) -> Option<&str> {
        event_id.rsplit_once('_').map(|(stream_id, _)| stream_id)
    }

    /// Replay every event of the owning stream that follows `last_event_id`
    ///
    /// Returns the owning stream id, or `None` when `last_event_id` is
    /// malformed, evicted, or never existed — in which case the sink is not
    /// invoked at all. Events of other streams are never yielded.
    pub async fn replay_after<F>(&self, last_event_id: &str, mut sink: F) -> Option<String>
    where
        F: FnMut(&str, &Value),
    {
        let (stream_id, _) = last_event_id.rsplit_once('_')?;

        let streams = self.streams.read().await;
        let log = streams.get(stream_id)?;

        let position = log
            .events
            .iter()
            .position(|event| event.event_id == last_event_id)?;

        for event in log.events.iter().skip(position + 1) {
            sink(&event.event_id, &event.message);
        }

        Some(stream_id.to_owned())
    }

    /// Number of retained events for a stream
    pub async fn stream_len(&self, stream_id: &str) -> usize {
        let streams = self.streams.read().await;
        streams.get(stream_id).map_or(0, |log| log.events.len())
    }

    /// Drop a stream's log entirely (used when its session terminates)
    pub async fn drop_stream(&self, stream_id: &str) {
        let mut streams = self.streams.write().await;
        if streams.remove(stream_id).is_some() {
            debug!(stream_id, "dropped event stream");
        }
    }
}
