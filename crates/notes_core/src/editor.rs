//! Save and open operations used by note editing screens.

use shared::{
    domain::{Note, NoteId},
    error::StorageError,
};
use thiserror::Error;
use tracing::info;

use crate::gateway::NoteGateway;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveNoteError {
    #[error("the title of the note can't be empty")]
    EmptyTitle,
    #[error("the content of the note can't be empty")]
    EmptyContent,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Validates and upserts a note. Blank title or content never reaches storage.
pub async fn save_note(gateway: &dyn NoteGateway, note: Note) -> Result<NoteId, SaveNoteError> {
    if note.title.trim().is_empty() {
        return Err(SaveNoteError::EmptyTitle);
    }
    if note.content.trim().is_empty() {
        return Err(SaveNoteError::EmptyContent);
    }
    let id = gateway.insert(note).await?;
    info!(note_id = id.0, "notes: note saved");
    Ok(id)
}

pub async fn load_note(gateway: &dyn NoteGateway, id: NoteId) -> Result<Option<Note>, StorageError> {
    gateway.get_by_id(id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryNoteGateway;
    use chrono::Utc;

    #[tokio::test]
    async fn rejects_blank_title_and_content() {
        let gateway = MemoryNoteGateway::new();

        let blank_title = Note::new("   ", "body", Utc::now(), 0);
        assert_eq!(
            save_note(&gateway, blank_title).await,
            Err(SaveNoteError::EmptyTitle)
        );

        let blank_content = Note::new("title", "", Utc::now(), 0);
        assert_eq!(
            save_note(&gateway, blank_content).await,
            Err(SaveNoteError::EmptyContent)
        );
        assert!(gateway.snapshot().is_empty());
    }

    #[tokio::test]
    async fn saves_and_reopens_note() {
        let gateway = MemoryNoteGateway::new();
        let note = Note::new("shopping", "milk, eggs", Utc::now(), 0xFFE6_EE9B);

        let id = save_note(&gateway, note.clone()).await.expect("saved");
        let loaded = load_note(&gateway, id).await.expect("lookup");
        assert_eq!(loaded, Some(note.with_id(id)));
        assert_eq!(load_note(&gateway, NoteId(id.0 + 1)).await, Ok(None));
    }
}
