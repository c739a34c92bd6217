use super::*;
use chrono::{TimeZone, Utc};
use std::time::Duration;
use tokio::time::timeout;

fn draft(title: &str) -> Note {
    Note::new(
        title,
        "content",
        Utc.timestamp_millis_opt(1_000).single().expect("timestamp"),
        0,
    )
}

async fn next_batch(feed: &mut NoteFeed) -> Vec<Note> {
    timeout(Duration::from_secs(2), feed.next())
        .await
        .expect("feed emission in time")
        .expect("feed still open")
        .expect("batch loads")
}

#[tokio::test]
async fn feed_emits_current_contents_immediately() {
    let gateway = MemoryNoteGateway::with_notes([draft("a").with_id(NoteId(3))]);
    let mut feed = gateway.subscribe_all();
    let batch = next_batch(&mut feed).await;
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id, Some(NoteId(3)));
}

#[tokio::test]
async fn feed_re_emits_after_insert_and_delete() {
    let gateway = MemoryNoteGateway::new();
    let mut feed = gateway.subscribe_all();
    assert!(next_batch(&mut feed).await.is_empty());

    let id = gateway.insert(draft("first")).await.expect("insert");
    let after_insert = next_batch(&mut feed).await;
    assert_eq!(after_insert.len(), 1);
    assert_eq!(after_insert[0].id, Some(id));

    gateway
        .delete(&after_insert[0])
        .await
        .expect("delete");
    assert!(next_batch(&mut feed).await.is_empty());
}

#[tokio::test]
async fn upsert_keeps_explicit_ids_and_never_reuses_them() {
    let gateway = MemoryNoteGateway::new();
    let explicit = gateway
        .insert(draft("explicit").with_id(NoteId(10)))
        .await
        .expect("explicit id");
    assert_eq!(explicit, NoteId(10));

    let fresh = gateway.insert(draft("fresh")).await.expect("fresh id");
    assert_eq!(fresh, NoteId(11));

    let replaced = gateway
        .insert(draft("replaced").with_id(NoteId(10)))
        .await
        .expect("replace");
    assert_eq!(replaced, NoteId(10));
    assert_eq!(gateway.snapshot().len(), 2);
    assert_eq!(
        gateway
            .get_by_id(NoteId(10))
            .await
            .expect("lookup")
            .map(|n| n.title),
        Some("replaced".to_string())
    );
}

#[tokio::test]
async fn deleting_absent_note_is_ok_and_silent() {
    let gateway = MemoryNoteGateway::with_notes([draft("kept").with_id(NoteId(1))]);
    let mut feed = gateway.subscribe_all();
    next_batch(&mut feed).await;

    gateway
        .delete(&draft("ghost").with_id(NoteId(99)))
        .await
        .expect("idempotent delete");
    gateway.delete(&draft("unsaved")).await.expect("no id");

    assert!(timeout(Duration::from_millis(50), feed.next()).await.is_err());
}

#[tokio::test]
async fn subscriptions_are_independent() {
    let gateway = MemoryNoteGateway::new();
    let first = gateway.subscribe_all();
    let mut second = gateway.subscribe_all();
    assert_eq!(gateway.subscriber_count(), 2);

    drop(first);
    assert_eq!(gateway.subscriber_count(), 1);

    next_batch(&mut second).await;
    gateway.insert(draft("still flowing")).await.expect("insert");
    assert_eq!(next_batch(&mut second).await.len(), 1);
}
