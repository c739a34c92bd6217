use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);
    };
}

id_newtype!(NoteId);

/// Packed ARGB colors offered when creating a note.
pub const NOTE_COLORS: [u32; 5] = [
    0xFFFF_AB91, // red orange
    0xFFE6_EE9B, // light green
    0xFFCF_94DA, // violet
    0xFF81_DEEA, // baby blue
    0xFFF4_8FB1, // red pink
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// `None` until storage has assigned an id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NoteId>,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub color: u32,
}

impl Note {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        color: u32,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            timestamp,
            color,
        }
    }

    pub fn with_id(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }
}
