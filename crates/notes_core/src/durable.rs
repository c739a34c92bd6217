//! SQLite-backed gateway. Change notifications are scoped to one gateway
//! instance.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{
    domain::{Note, NoteId},
    error::StorageError,
};
use storage::Storage;
use tokio::sync::broadcast;
use tracing::debug;

use crate::gateway::{change_feed, NoteFeed, NoteGateway, CHANGE_CHANNEL_CAPACITY};

/// Gateway over the SQLite store. Change notifications fan out to every feed
/// opened through this gateway instance.
pub struct DurableNoteGateway {
    storage: Storage,
    changes: broadcast::Sender<()>,
}

impl DurableNoteGateway {
    pub fn new(storage: Storage) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { storage, changes }
    }

    pub async fn open(database_url: &str) -> Result<Arc<Self>> {
        let storage = Storage::new(database_url)
            .await
            .with_context(|| format!("failed to open note storage at '{database_url}'"))?;
        Ok(Arc::new(Self::new(storage)))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn notify_changed(&self) {
        let receivers = self.changes.send(()).unwrap_or(0);
        debug!(receivers, "notes: change notification sent");
    }
}

fn storage_error(err: anyhow::Error) -> StorageError {
    let message = format!("{err:#}");
    let lower = message.to_ascii_lowercase();
    if lower.contains("constraint") {
        StorageError::Constraint(message)
    } else if lower.contains("closed pool") {
        StorageError::Closed
    } else {
        StorageError::Io(message)
    }
}

#[async_trait]
impl NoteGateway for DurableNoteGateway {
    fn subscribe_all(&self) -> NoteFeed {
        let storage = self.storage.clone();
        change_feed(self.changes.subscribe(), move || {
            let storage = storage.clone();
            async move { storage.list_notes().await.map_err(storage_error) }
        })
    }

    async fn get_by_id(&self, id: NoteId) -> Result<Option<Note>, StorageError> {
        self.storage.note_by_id(id).await.map_err(storage_error)
    }

    async fn insert(&self, note: Note) -> Result<NoteId, StorageError> {
        let id = self
            .storage
            .upsert_note(&note)
            .await
            .map_err(storage_error)?;
        self.notify_changed();
        Ok(id)
    }

    async fn delete(&self, note: &Note) -> Result<(), StorageError> {
        let Some(id) = note.id else {
            debug!("notes: delete of unsaved note ignored");
            return Ok(());
        };
        if self.storage.delete_note(id).await.map_err(storage_error)? {
            self.notify_changed();
        }
        Ok(())
    }
}
