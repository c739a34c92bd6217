//! Observer-side events published by the note list controller.

use std::sync::Arc;

use shared::{domain::Note, error::StorageError, order::SortSpec, protocol::ListState};
use thiserror::Error;

#[derive(Debug, Clone)]
pub enum ListEvent {
    StateChanged(Arc<ListState>),
    NoteDeleted(Note),
    NoteRestored(Note),
    Failed(ListFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListFailure {
    #[error("failed to delete note '{}': {error}", .note.title)]
    Delete { note: Note, error: StorageError },
    #[error("failed to restore note '{}': {error}", .note.title)]
    Restore { note: Note, error: StorageError },
    #[error("note view ({sort}) failed to reload: {error}")]
    Feed { sort: SortSpec, error: StorageError },
}
