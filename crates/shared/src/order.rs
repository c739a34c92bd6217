use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// How the note list is ordered. Two specs are equal only when both the
/// criterion and the direction match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "direction", rename_all = "snake_case")]
pub enum SortSpec {
    ByTitle(SortDirection),
    ByDate(SortDirection),
    ByColor(SortDirection),
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec::ByDate(SortDirection::Descending)
    }
}

impl SortSpec {
    pub fn direction(self) -> SortDirection {
        match self {
            SortSpec::ByTitle(direction)
            | SortSpec::ByDate(direction)
            | SortSpec::ByColor(direction) => direction,
        }
    }

    pub fn with_direction(self, direction: SortDirection) -> Self {
        match self {
            SortSpec::ByTitle(_) => SortSpec::ByTitle(direction),
            SortSpec::ByDate(_) => SortSpec::ByDate(direction),
            SortSpec::ByColor(_) => SortSpec::ByColor(direction),
        }
    }

    /// Total order over notes. Direction applies to the primary key only; ties
    /// fall back to ascending id so equal keys always come out the same way.
    pub fn compare(self, a: &Note, b: &Note) -> Ordering {
        let primary = match self {
            SortSpec::ByTitle(_) => a
                .title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title)),
            SortSpec::ByDate(_) => a.timestamp.cmp(&b.timestamp),
            SortSpec::ByColor(_) => a.color.cmp(&b.color),
        };
        self.direction().apply(primary).then_with(|| a.id.cmp(&b.id))
    }
}

pub fn sort_notes(spec: SortSpec, mut notes: Vec<Note>) -> Vec<Note> {
    notes.sort_by(|a, b| spec.compare(a, b));
    notes
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            SortSpec::ByTitle(_) => "title",
            SortSpec::ByDate(_) => "date",
            SortSpec::ByColor(_) => "color",
        };
        let direction = match self.direction() {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        write!(f, "{key}-{direction}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid sort '{0}': expected <title|date|color>[-<asc|desc>]")]
pub struct ParseSortSpecError(pub String);

impl FromStr for SortSpec {
    type Err = ParseSortSpecError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        let (key, direction) = match normalized.split_once(['-', ':', ' ']) {
            Some((key, direction)) => (key.trim(), Some(direction.trim())),
            None => (normalized.as_str(), None),
        };

        let direction = match direction {
            None | Some("desc") | Some("descending") => SortDirection::Descending,
            Some("asc") | Some("ascending") => SortDirection::Ascending,
            Some(_) => return Err(ParseSortSpecError(raw.to_string())),
        };

        match key {
            "title" => Ok(SortSpec::ByTitle(direction)),
            "date" => Ok(SortSpec::ByDate(direction)),
            "color" | "colour" => Ok(SortSpec::ByColor(direction)),
            _ => Err(ParseSortSpecError(raw.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "tests/order_tests.rs"]
mod tests;
