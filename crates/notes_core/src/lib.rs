//! Reactive note list: a sorted view over the note store, sort switching
//! without stale results, and single-level delete/undo.

mod controller;
mod durable;
pub mod editor;
mod events;
pub mod gateway;
pub mod sorted_view;

pub use controller::ListController;
pub use durable::DurableNoteGateway;
pub use events::{ListEvent, ListFailure};
pub use gateway::{MemoryNoteGateway, NoteFeed, NoteGateway};
