// ABOUTME: Integration tests for the replayable event store
// ABOUTME: Covers per-stream replay order, cross-stream isolation, and capacity eviction

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use relay_mcp_server::mcp::event_store::EventStore;
use serde_json::json;

/// Replay after event k yields exactly events k+1..N, in append order
#[tokio::test]
async fn test_replay_yields_suffix_in_append_order() {
    let store = EventStore::new(64);

    let mut ids = Vec::new();
    for n in 0..10 {
        ids.push(store.append("stream-a", json!({ "n": n })).await);
    }

    let anchor = 3;
    let mut replayed = Vec::new();
    let owner = store
        .replay_after(&ids[anchor], |event_id, message| {
            replayed.push((event_id.to_owned(), message.clone()));
        })
        .await;

    assert_eq!(owner.as_deref(), Some("stream-a"));
    assert_eq!(replayed.len(), 10 - anchor - 1);
    for (offset, (event_id, message)) in replayed.iter().enumerate() {
        let expected = anchor + 1 + offset;
        assert_eq!(event_id, &ids[expected], "replay must preserve append order");
        assert_eq!(message["n"], json!(expected));
    }
}

/// Replay never yields an event belonging to a different stream
#[tokio::test]
async fn test_replay_never_crosses_streams() {
    let store = EventStore::new(64);

    let anchor = store.append("stream-a", json!("a0")).await;
    store.append("stream-b", json!("b0")).await;
    store.append("stream-a", json!("a1")).await;
    store.append("stream-b", json!("b1")).await;
    store.append("stream-a", json!("a2")).await;

    let mut replayed = Vec::new();
    let owner = store
        .replay_after(&anchor, |_, message| replayed.push(message.clone()))
        .await;

    assert_eq!(owner.as_deref(), Some("stream-a"));
    assert_eq!(replayed, vec![json!("a1"), json!("a2")]);
}

/// An unknown event id replays nothing and returns no owner
#[tokio::test]
async fn test_unknown_event_id_is_empty() {
    let store = EventStore::new(64);
    store.append("stream-a", json!(1)).await;

    let mut invoked = false;
    let owner = store
        .replay_after("stream-a_ffffffffffffffff", |_, _| invoked = true)
        .await;

    assert!(owner.is_none());
    assert!(!invoked, "sink must not run for an unknown id");

    let owner = store.replay_after("not-an-event-id", |_, _| invoked = true).await;
    assert!(owner.is_none());
    assert!(!invoked);
}

/// The last event of a stream replays an empty suffix, not an error
#[tokio::test]
async fn test_replay_from_tail_is_empty() {
    let store = EventStore::new(64);
    store.append("stream-a", json!(1)).await;
    let tail = store.append("stream-a", json!(2)).await;

    let mut replayed = 0;
    let owner = store.replay_after(&tail, |_, _| replayed += 1).await;

    assert_eq!(owner.as_deref(), Some("stream-a"));
    assert_eq!(replayed, 0);
}

/// Capacity bounds the log; evicted ids behave as unknown
#[tokio::test]
async fn test_capacity_eviction_forgets_oldest() {
    let store = EventStore::new(3);

    let first = store.append("stream-a", json!(0)).await;
    for n in 1..6 {
        store.append("stream-a", json!(n)).await;
    }

    assert_eq!(store.stream_len("stream-a").await, 3);

    let owner = store.replay_after(&first, |_, _| {}).await;
    assert!(owner.is_none(), "evicted anchor must be treated as unknown");
}

/// Event ids of different streams never collide
#[tokio::test]
async fn test_ids_are_stream_scoped() {
    let store = EventStore::new(8);
    let a = store.append("stream-a", json!(1)).await;
    let b = store.append("stream-b", json!(1)).await;

    assert_ne!(a, b);
    assert_eq!(EventStore::owner_of(&a), Some("stream-a"));
    assert_eq!(EventStore::owner_of(&b), Some("stream-b"));
}

/// Dropping a stream removes its history
#[tokio::test]
async fn test_drop_stream_clears_history() {
    let store = EventStore::new(8);
    let anchor = store.append("stream-a", json!(1)).await;
    store.append("stream-a", json!(2)).await;

    store.drop_stream("stream-a").await;
    assert_eq!(store.stream_len("stream-a").await, 0);

    let owner = store.replay_after(&anchor, |_, _| {}).await;
    assert!(owner.is_none());
}
