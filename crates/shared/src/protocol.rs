use serde::{Deserialize, Serialize};

use crate::{domain::Note, order::SortSpec};

/// Commands accepted by the note list controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ListCommand {
    Reorder(SortSpec),
    Delete(Note),
    Restore,
    ToggleOrderPanel,
}

/// Snapshot published by the controller. Transitions build a new value
/// instead of editing fields in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListState {
    pub notes: Vec<Note>,
    pub active_sort: SortSpec,
    pub order_panel_visible: bool,
}

impl ListState {
    pub fn with_view(&self, notes: Vec<Note>, active_sort: SortSpec) -> Self {
        Self {
            notes,
            active_sort,
            order_panel_visible: self.order_panel_visible,
        }
    }

    pub fn with_order_panel_toggled(&self) -> Self {
        Self {
            notes: self.notes.clone(),
            active_sort: self.active_sort,
            order_panel_visible: !self.order_panel_visible,
        }
    }
}
