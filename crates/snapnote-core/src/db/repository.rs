//! Note repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{Attachments, NewNote, Note};
use crate::util::unix_millis_now;
use rusqlite::{params, Connection, OptionalExtension};

const NOTE_COLUMNS: &str = "id, title, body, category, attachments, created_at, updated_at";

/// Trait for note storage operations
pub trait NoteRepository {
    /// Create a new note
    fn create(&self, input: NewNote) -> Result<Note>;

    /// Get a note by ID
    fn get(&self, id: &str) -> Result<Option<Note>>;

    /// List notes, most recently updated first
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Note>>;

    /// List every note, most recently updated first
    fn list_all(&self) -> Result<Vec<Note>>;

    /// List notes in one category
    fn list_by_category(&self, category: &str, limit: usize, offset: usize) -> Result<Vec<Note>>;

    /// Case-insensitive substring search over title and body
    fn search(&self, query: &str, limit: usize) -> Result<Vec<Note>>;

    /// IDs starting with `prefix`, sorted
    fn find_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;

    /// Replace a note's content and bump its update time
    fn update(&self, note: &Note) -> Result<Note>;

    /// Delete a note permanently
    fn delete(&self, id: &str) -> Result<()>;

    /// Insert or overwrite a note keyed by ID, keeping its timestamps
    fn upsert(&self, note: &Note) -> Result<()>;

    /// Remove every note
    fn delete_all(&self) -> Result<usize>;

    /// Number of stored notes
    fn count(&self) -> Result<usize>;
}

/// `SQLite` implementation of `NoteRepository`
pub struct SqliteNoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteNoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a note from a database row
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        let attachments: String = row.get(4)?;
        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            body: row.get(2)?,
            category: row.get(3)?,
            attachments: serde_json::from_str(&attachments).unwrap_or_else(|error| {
                tracing::warn!("Discarding unreadable attachments: {error}");
                Attachments::default()
            }),
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn query_notes(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let notes = stmt
            .query_map(params, Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Substring pattern for a `LIKE` search.
fn like_pattern(query: &str) -> String {
    format!("%{}%", escape_like(query))
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create(&self, input: NewNote) -> Result<Note> {
        let note = input.into_note();
        if note.is_empty() {
            return Err(Error::Validation(
                "Note needs a title, body or image".to_string(),
            ));
        }

        self.upsert(&note)?;
        tracing::debug!("Created note {}", note.id);
        Ok(note)
    }

    fn get(&self, id: &str) -> Result<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"),
                params![id],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<Note>> {
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 ORDER BY COALESCE(updated_at, created_at, 0) DESC, id DESC
                 LIMIT ? OFFSET ?"
            ),
            params![limit as i64, offset as i64],
        )
    }

    fn list_all(&self) -> Result<Vec<Note>> {
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 ORDER BY COALESCE(updated_at, created_at, 0) DESC, id DESC"
            ),
            [],
        )
    }

    fn list_by_category(&self, category: &str, limit: usize, offset: usize) -> Result<Vec<Note>> {
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE category = ?
                 ORDER BY COALESCE(updated_at, created_at, 0) DESC, id DESC
                 LIMIT ? OFFSET ?"
            ),
            params![category, limit as i64, offset as i64],
        )
    }

    fn search(&self, query: &str, limit: usize) -> Result<Vec<Note>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list(limit, 0);
        }

        let pattern = like_pattern(query);
        self.query_notes(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes
                 WHERE title LIKE ?1 ESCAPE '\\' OR body LIKE ?1 ESCAPE '\\'
                 ORDER BY COALESCE(updated_at, created_at, 0) DESC, id DESC
                 LIMIT ?2"
            ),
            params![pattern, limit as i64],
        )
    }

    fn find_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let pattern = format!("{}%", escape_like(prefix));
        let mut stmt = self.conn.prepare(
            "SELECT id FROM notes WHERE id LIKE ? ESCAPE '\\' ORDER BY id LIMIT ?",
        )?;
        let ids = stmt
            .query_map(params![pattern, limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    fn update(&self, note: &Note) -> Result<Note> {
        let mut updated = note.clone();
        updated.updated_at = Some(unix_millis_now().max(note.created_at.unwrap_or(0)));
        let attachments = serde_json::to_string(&updated.attachments)?;

        let rows = self.conn.execute(
            "UPDATE notes SET title = ?, body = ?, category = ?, attachments = ?, updated_at = ?
             WHERE id = ?",
            params![
                updated.title,
                updated.body,
                updated.category,
                attachments,
                updated.updated_at,
                updated.id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(note.id.clone()));
        }

        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?", params![id])?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn upsert(&self, note: &Note) -> Result<()> {
        let attachments = serde_json::to_string(&note.attachments)?;
        self.conn.execute(
            "INSERT INTO notes (id, title, body, category, attachments, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                category = excluded.category,
                attachments = excluded.attachments,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
            params![
                note.id,
                note.title,
                note.body,
                note.category,
                attachments,
                note.created_at,
                note.updated_at
            ],
        )?;
        Ok(())
    }

    fn delete_all(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM notes", [])?)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
