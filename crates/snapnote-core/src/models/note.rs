//! Note model

use serde::{Deserialize, Serialize};

use crate::util::{generate_id, unix_millis_now};

use super::attachment::{Attachments, Image};

/// Title used wherever a note has no title of its own.
pub const UNTITLED_NOTE: &str = "未命名笔记";

/// Category shown for a note whose category is blank.
pub const UNCATEGORIZED: &str = "未分类";

/// Stem used in export file names when a note has no title.
pub const UNTITLED_FILE_STEM: &str = "note";

/// A captured note
///
/// Every field except `id` carries a serde default so partial payloads from
/// imports deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier (`note_<base36 time>_<random>`)
    pub id: String,
    /// Optional title
    #[serde(default)]
    pub title: String,
    /// Plain text / Markdown body
    #[serde(default)]
    pub body: String,
    /// Category ID the note belongs to
    #[serde(default)]
    pub category: String,
    /// Screenshot and image attachments
    #[serde(default)]
    pub attachments: Attachments,
    /// Creation timestamp (Unix ms)
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Last update timestamp (Unix ms)
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl Note {
    /// Create a new note with a fresh ID and both timestamps set to now
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = unix_millis_now();
        Self {
            id: generate_id("note"),
            title: title.into(),
            body: body.into(),
            category: category.into(),
            attachments: Attachments::default(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Creation time, falling back to the current time.
    #[must_use]
    pub fn created_at_or_now(&self) -> i64 {
        self.created_at.unwrap_or_else(unix_millis_now)
    }

    /// Update time, falling back to the creation time and then to now.
    #[must_use]
    pub fn updated_at_or_fallback(&self) -> i64 {
        self.updated_at
            .or(self.created_at)
            .unwrap_or_else(unix_millis_now)
    }

    /// `(created, updated)` resolved together so a note missing both
    /// timestamps gets one consistent "now".
    #[must_use]
    pub fn resolved_timestamps(&self) -> (i64, i64) {
        let created = self.created_at_or_now();
        (created, self.updated_at.unwrap_or(created))
    }

    /// Trimmed title, or the untitled placeholder.
    #[must_use]
    pub fn display_title(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            UNTITLED_NOTE
        } else {
            title
        }
    }

    /// Trimmed category ID, or the uncategorized placeholder.
    #[must_use]
    pub fn display_category(&self) -> &str {
        let category = self.category.trim();
        if category.is_empty() {
            UNCATEGORIZED
        } else {
            category
        }
    }

    /// Title as it appears in export file names; ASCII `note` when untitled.
    #[must_use]
    pub fn file_stem(&self) -> &str {
        let title = self.title.trim();
        if title.is_empty() {
            UNTITLED_FILE_STEM
        } else {
            title
        }
    }

    /// Get the first body line as a preview, truncated to `max_len` characters
    #[must_use]
    pub fn body_preview(&self, max_len: usize) -> String {
        self.body
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .trim()
            .chars()
            .take(max_len)
            .collect()
    }

    /// Check whether the note has neither text nor images
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.body.trim().is_empty()
            && self.attachments.images.is_empty()
    }
}

/// Input for creating a note
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewNote {
    pub title: String,
    pub body: String,
    pub category: String,
    pub images: Vec<Image>,
}

impl NewNote {
    /// Materialize into a note with a fresh ID and timestamps
    #[must_use]
    pub fn into_note(self) -> Note {
        let mut note = Note::new(self.title.trim(), self.body, self.category.trim());
        note.attachments.images = self.images;
        note
    }
}
