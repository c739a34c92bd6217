//! Store gateway: the controller's only path to persisted notes.

use std::{
    collections::BTreeMap,
    future::Future,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use futures::{future, stream, stream::BoxStream, StreamExt};
use shared::{
    domain::{Note, NoteId},
    error::StorageError,
};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Unordered snapshots of the whole collection: one right away, then one per change.
pub type NoteFeed = BoxStream<'static, Result<Vec<Note>, StorageError>>;

pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[async_trait]
pub trait NoteGateway: Send + Sync {
    /// Starts an independent subscription. Dropping the stream cancels it.
    fn subscribe_all(&self) -> NoteFeed;
    async fn get_by_id(&self, id: NoteId) -> Result<Option<Note>, StorageError>;
    /// Upsert. Returns the id the note is stored under.
    async fn insert(&self, note: Note) -> Result<NoteId, StorageError>;
    /// Deleting a note that is not stored succeeds.
    async fn delete(&self, note: &Note) -> Result<(), StorageError>;
}

/// Builds a feed that reloads the collection once immediately and again after
/// every change notification. A lagged receiver still triggers a reload.
pub(crate) fn change_feed<F, Fut>(changes: broadcast::Receiver<()>, load: F) -> NoteFeed
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vec<Note>, StorageError>> + Send + 'static,
{
    stream::once(future::ready(()))
        .chain(BroadcastStream::new(changes).map(|_| ()))
        .then(move |()| load())
        .boxed()
}

#[derive(Default)]
struct MemoryNotes {
    rows: BTreeMap<NoteId, Note>,
    last_id: i64,
}

/// Process-local store with the same contract as the SQLite gateway.
pub struct MemoryNoteGateway {
    notes: Arc<RwLock<MemoryNotes>>,
    changes: broadcast::Sender<()>,
}

impl Default for MemoryNoteGateway {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            notes: Arc::new(RwLock::new(MemoryNotes::default())),
            changes,
        }
    }
}

impl MemoryNoteGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let gateway = Self::default();
        {
            let mut guard = gateway.notes.write().unwrap_or_else(PoisonError::into_inner);
            for note in notes {
                upsert(&mut guard, note);
            }
        }
        gateway
    }

    /// Number of live `subscribe_all` feeds.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    pub fn snapshot(&self) -> Vec<Note> {
        snapshot(&self.notes)
    }
}

fn snapshot(notes: &RwLock<MemoryNotes>) -> Vec<Note> {
    notes
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .rows
        .values()
        .cloned()
        .collect()
}

fn upsert(notes: &mut MemoryNotes, mut note: Note) -> NoteId {
    let id = match note.id {
        Some(id) => {
            notes.last_id = notes.last_id.max(id.0);
            id
        }
        None => {
            notes.last_id += 1;
            NoteId(notes.last_id)
        }
    };
    note.id = Some(id);
    notes.rows.insert(id, note);
    id
}

#[async_trait]
impl NoteGateway for MemoryNoteGateway {
    fn subscribe_all(&self) -> NoteFeed {
        let notes = Arc::clone(&self.notes);
        change_feed(self.changes.subscribe(), move || {
            future::ready(Ok(snapshot(&notes)))
        })
    }

    async fn get_by_id(&self, id: NoteId) -> Result<Option<Note>, StorageError> {
        let guard = self.notes.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.rows.get(&id).cloned())
    }

    async fn insert(&self, note: Note) -> Result<NoteId, StorageError> {
        let id = {
            let mut guard = self.notes.write().unwrap_or_else(PoisonError::into_inner);
            upsert(&mut guard, note)
        };
        let _ = self.changes.send(());
        Ok(id)
    }

    async fn delete(&self, note: &Note) -> Result<(), StorageError> {
        let Some(id) = note.id else {
            return Ok(());
        };
        let removed = {
            let mut guard = self.notes.write().unwrap_or_else(PoisonError::into_inner);
            guard.rows.remove(&id).is_some()
        };
        if removed {
            let _ = self.changes.send(());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
