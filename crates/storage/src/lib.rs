use anyhow::{Context, Result};
use chrono::DateTime;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Note, NoteId};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Every stored note, in no particular order.
    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let rows = sqlx::query("SELECT id, title, content, timestamp_ms, color FROM notes")
            .fetch_all(&self.pool)
            .await
            .context("failed to list notes")?;
        Ok(rows.iter().map(note_from_row).collect())
    }

    pub async fn note_by_id(&self, id: NoteId) -> Result<Option<Note>> {
        let row = sqlx::query("SELECT id, title, content, timestamp_ms, color FROM notes WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load note {}", id.0))?;
        Ok(row.as_ref().map(note_from_row))
    }

    /// Inserts a note, or replaces the stored row when `note.id` is already taken.
    /// A note without an id gets a fresh one from SQLite.
    pub async fn upsert_note(&self, note: &Note) -> Result<NoteId> {
        let rec = sqlx::query(
            "INSERT INTO notes (id, title, content, timestamp_ms, color) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                timestamp_ms = excluded.timestamp_ms,
                color = excluded.color
             RETURNING id",
        )
        .bind(note.id.map(|id| id.0))
        .bind(note.title.as_str())
        .bind(note.content.as_str())
        .bind(note.timestamp.timestamp_millis())
        .bind(i64::from(note.color))
        .fetch_one(&self.pool)
        .await
        .context("failed to upsert note")?;
        Ok(NoteId(rec.get::<i64, _>(0)))
    }

    /// Returns whether a row was removed. Deleting a missing note is not an error.
    pub async fn delete_note(&self, id: NoteId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete note {}", id.0))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_notes(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&self.pool)
            .await
            .context("failed to count notes")?;
        Ok(count)
    }
}

fn note_from_row(r: &SqliteRow) -> Note {
    Note {
        id: Some(NoteId(r.get::<i64, _>(0))),
        title: r.get::<String, _>(1),
        content: r.get::<String, _>(2),
        timestamp: DateTime::from_timestamp_millis(r.get::<i64, _>(3)).unwrap_or_default(),
        color: u32::try_from(r.get::<i64, _>(4)).unwrap_or_default(),
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
