//! Concurrency tests for the in-memory reference stream.
//!
//! These exercise the contract's hard cases: blocked readers must be woken
//! by appends, sealing and cross-task closes, and filtered cursors must
//! observe exactly their subsequence in append order.

use std::time::Duration;

use chrono::Utc;
use spool_core::{cancel_pair, Event, EventStream, SpoolError, StreamCursor, TypeFilter};
use spool_memory::MemoryStream;

const WAIT: Duration = Duration::from_millis(500);

fn event(event_type: &str) -> Event {
    Event::new(event_type, vec![])
}

#[tokio::test]
async fn test_cursor_observes_filtered_subsequence_in_order() {
    let (_handle, cancel) = cancel_pair();
    let stream = MemoryStream::new("orders");

    stream
        .append(
            Utc::now(),
            vec![event("placed"), event("audited"), event("shipped")],
        )
        .unwrap();
    stream
        .append(Utc::now(), vec![event("audited"), event("placed")])
        .unwrap();

    let mut all = stream.open(0, TypeFilter::all()).await.unwrap();
    let mut filtered = stream
        .open(0, TypeFilter::of(["placed", "shipped"]))
        .await
        .unwrap();

    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.push(all.next(&cancel).await.unwrap().offset);
    }
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);

    let mut matched = Vec::new();
    for _ in 0..3 {
        let envelope = filtered.next(&cancel).await.unwrap();
        matched.push((envelope.offset, envelope.event.event_type.clone()));
    }
    assert_eq!(
        matched,
        vec![
            (0, "placed".to_string()),
            (2, "shipped".to_string()),
            (4, "placed".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_append_wakes_blocked_reader() {
    let (_handle, cancel) = cancel_pair();
    let stream = std::sync::Arc::new(MemoryStream::new("orders"));

    let mut cursor = stream.open(0, TypeFilter::all()).await.unwrap();

    let reader = tokio::spawn(async move {
        let envelope = cursor.next(&cancel).await.unwrap();
        envelope.offset
    });

    // Let the reader suspend before appending.
    tokio::time::sleep(Duration::from_millis(20)).await;
    stream.append(Utc::now(), vec![event("placed")]).unwrap();

    let offset = tokio::time::timeout(WAIT, reader)
        .await
        .expect("reader should be woken by the append")
        .unwrap();
    assert_eq!(offset, 0);
}

#[tokio::test]
async fn test_reader_survives_multiple_append_batches() {
    let (_handle, cancel) = cancel_pair();
    let stream = std::sync::Arc::new(MemoryStream::new("orders"));
    let mut cursor = stream.open(0, TypeFilter::all()).await.unwrap();

    let writer = {
        let stream = stream.clone();
        tokio::spawn(async move {
            for i in 0..10 {
                stream
                    .append(Utc::now(), vec![event(&format!("e{i}"))])
                    .unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    let mut offsets = Vec::new();
    for _ in 0..10 {
        let envelope = tokio::time::timeout(WAIT, cursor.next(&cancel))
            .await
            .expect("reader must not miss a wake-up")
            .unwrap();
        offsets.push(envelope.offset);
    }
    assert_eq!(offsets, (0..10).collect::<Vec<u64>>());

    writer.await.unwrap();
}

#[tokio::test]
async fn test_seal_unblocks_reader_waiting_for_events() {
    let (_handle, cancel) = cancel_pair();
    let stream = std::sync::Arc::new(MemoryStream::new("orders"));
    let mut cursor = stream.open(0, TypeFilter::all()).await.unwrap();

    let reader = tokio::spawn(async move { cursor.next(&cancel).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    stream.seal();

    let result = tokio::time::timeout(WAIT, reader)
        .await
        .expect("reader should be woken by the seal")
        .unwrap();
    assert!(matches!(result, Err(SpoolError::Sealed)));
}

#[tokio::test]
async fn test_seal_unblocks_reader_skipping_trailing_non_matches() {
    let (_handle, cancel) = cancel_pair();
    let stream = std::sync::Arc::new(MemoryStream::new("orders"));

    // The reader's filter matches nothing that has been appended, so it
    // skips to the end of the stream and suspends just before the sealed
    // boundary.
    stream
        .append(Utc::now(), vec![event("audited"), event("audited")])
        .unwrap();
    let mut cursor = stream.open(0, TypeFilter::of(["placed"])).await.unwrap();

    let reader = tokio::spawn(async move { cursor.next(&cancel).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    stream.seal();

    let result = tokio::time::timeout(WAIT, reader)
        .await
        .expect("mid-skip reader must observe the seal, not hang")
        .unwrap();
    assert!(matches!(result, Err(SpoolError::Sealed)));
}

#[tokio::test]
async fn test_close_from_another_task_wakes_blocked_reader() {
    let (_handle, cancel) = cancel_pair();
    let stream = MemoryStream::new("orders");

    let mut cursor = stream.open_cursor(0, TypeFilter::all()).unwrap();
    let closer = cursor.closer();

    let reader = tokio::spawn(async move { cursor.next(&cancel).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    closer.close();
    // Racing a second close is safe.
    closer.close();

    let result = tokio::time::timeout(WAIT, reader)
        .await
        .expect("reader should be woken by the close")
        .unwrap();
    assert!(matches!(result, Err(SpoolError::CursorClosed)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_close_racing_a_starting_read_never_strands_the_reader() {
    // The close may land at any point around the reader's first poll,
    // including between its closed-flag check and its suspension. Every
    // interleaving must end in CursorClosed, never a hang.
    for _ in 0..200 {
        let (_handle, cancel) = cancel_pair();
        let stream = MemoryStream::new("orders");
        let mut cursor = stream.open_cursor(0, TypeFilter::all()).unwrap();
        let closer = cursor.closer();

        let reader = tokio::spawn(async move { cursor.next(&cancel).await });
        closer.close();

        let result = tokio::time::timeout(WAIT, reader)
            .await
            .expect("reader must observe the close, not hang")
            .unwrap();
        assert!(matches!(result, Err(SpoolError::CursorClosed)));
    }
}

#[tokio::test]
async fn test_cancel_unblocks_reader() {
    let (handle, cancel) = cancel_pair();
    let stream = MemoryStream::new("orders");
    let mut cursor = stream.open(0, TypeFilter::all()).await.unwrap();

    let reader = tokio::spawn(async move { cursor.next(&cancel).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.cancel();

    let result = tokio::time::timeout(WAIT, reader)
        .await
        .expect("reader should be woken by cancellation")
        .unwrap();
    assert!(matches!(result, Err(SpoolError::Canceled)));
}

#[tokio::test]
async fn test_cursor_skips_truncated_gap_only_when_ahead_of_it() {
    let (_handle, cancel) = cancel_pair();
    let stream = MemoryStream::new("orders");
    stream
        .append(
            Utc::now(),
            vec![event("a"), event("b"), event("c"), event("d")],
        )
        .unwrap();
    stream.truncate(2);

    // Opening inside the retained window reads normally.
    let mut cursor = stream.open(2, TypeFilter::all()).await.unwrap();
    assert_eq!(cursor.next(&cancel).await.unwrap().offset, 2);
    assert_eq!(cursor.next(&cancel).await.unwrap().offset, 3);

    // Opening behind the window reports the data loss, naming both offsets.
    let mut behind = stream.open(0, TypeFilter::all()).await.unwrap();
    match behind.next(&cancel).await {
        Err(SpoolError::Truncated { requested, first }) => {
            assert_eq!((requested, first), (0, 2));
        }
        other => panic!("expected Truncated, got {other:?}"),
    }
}
