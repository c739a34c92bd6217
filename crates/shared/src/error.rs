use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure at the persistence boundary. Never retried by callers in this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum StorageError {
    #[error("storage i/o failure: {0}")]
    Io(String),
    #[error("storage constraint violated: {0}")]
    Constraint(String),
    #[error("note store is closed")]
    Closed,
}

impl StorageError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::Constraint(message.into())
    }
}
