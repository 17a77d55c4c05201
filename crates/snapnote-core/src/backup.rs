//! JSON backup snapshots and import payloads.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Attachments, Category, Note, Settings};
use crate::util::{to_iso8601, unix_millis_now};

/// Full snapshot of the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    /// When the snapshot was taken (ISO-8601)
    pub exported_at: String,
    pub notes: Vec<Note>,
    pub categories: Vec<Category>,
    pub settings: Settings,
}

/// A note as it appears in an import document.
///
/// Only `id` is required. Fields the document leaves out stay `None`, so a
/// merge keeps the stored value for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedNote {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Attachments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl ImportedNote {
    /// Lay this record over `existing`.
    ///
    /// A new note lands in `fallback_category` unless it names a category.
    /// Missing timestamps are stamped with `now`: `created_at` keeps the
    /// stored value first, `updated_at` falls back to the incoming
    /// `created_at`.
    #[must_use]
    pub fn merge_into(&self, existing: Option<Note>, fallback_category: &str, now: i64) -> Note {
        let base = existing.unwrap_or_else(|| Note {
            id: self.id.clone(),
            title: String::new(),
            body: String::new(),
            category: fallback_category.to_string(),
            attachments: Attachments::default(),
            created_at: None,
            updated_at: None,
        });

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .map_or(base.category, ToString::to_string);

        Note {
            id: self.id.clone(),
            title: self.title.clone().unwrap_or(base.title),
            body: self.body.clone().unwrap_or(base.body),
            category,
            attachments: self.attachments.clone().unwrap_or(base.attachments),
            created_at: Some(self.created_at.or(base.created_at).unwrap_or(now)),
            updated_at: Some(self.updated_at.or(self.created_at).unwrap_or(now)),
        }
    }
}

impl From<Note> for ImportedNote {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: Some(note.title),
            body: Some(note.body),
            category: Some(note.category),
            attachments: Some(note.attachments),
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

/// Data accepted by an import; every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    #[serde(default)]
    pub notes: Option<Vec<ImportedNote>>,
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
    #[serde(default)]
    pub settings: Option<Settings>,
}

impl From<BackupPayload> for ImportPayload {
    fn from(backup: BackupPayload) -> Self {
        Self {
            notes: Some(backup.notes.into_iter().map(ImportedNote::from).collect()),
            categories: Some(backup.categories),
            settings: Some(backup.settings),
        }
    }
}

/// Assemble a snapshot stamped with the current time.
#[must_use]
pub fn build_backup(notes: Vec<Note>, categories: Vec<Category>, settings: Settings) -> BackupPayload {
    BackupPayload {
        exported_at: to_iso8601(unix_millis_now()),
        notes,
        categories,
        settings,
    }
}

/// Render a snapshot as pretty-printed JSON.
pub fn render_backup(backup: &BackupPayload) -> serde_json::Result<String> {
    serde_json::to_string_pretty(backup)
}

/// Parse and validate an import document.
pub fn parse_import(json: &str) -> Result<ImportPayload> {
    let payload: ImportPayload = serde_json::from_str(json)
        .map_err(|error| Error::Format(format!("Invalid import JSON: {error}")))?;

    if let Some(notes) = &payload.notes {
        if let Some(index) = notes.iter().position(|note| note.id.trim().is_empty()) {
            return Err(Error::Validation(format!(
                "Imported note at index {index} has no id"
            )));
        }
    }
    if let Some(categories) = &payload.categories {
        if let Some(index) = categories
            .iter()
            .position(|category| category.id.trim().is_empty())
        {
            return Err(Error::Validation(format!(
                "Imported category at index {index} has no id"
            )));
        }
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_categories;

    #[test]
    fn backup_round_trips_through_import() {
        let note = Note::new("Title", "Body", "default");
        let backup = build_backup(vec![note.clone()], default_categories(), Settings::default());
        let json = render_backup(&backup).unwrap();

        assert!(json.contains("\"exportedAt\""));
        let payload = parse_import(&json).unwrap();
        assert_eq!(payload.notes, Some(vec![ImportedNote::from(note)]));
        assert_eq!(payload.categories, Some(default_categories()));
        assert_eq!(payload.settings, Some(Settings::default()));
    }

    #[test]
    fn parse_import_accepts_partial_payloads() {
        let payload = parse_import(r#"{"notes":[{"id":"n1","title":"New"}]}"#).unwrap();
        let notes = payload.notes.unwrap();
        assert_eq!(notes[0].title.as_deref(), Some("New"));
        assert!(notes[0].body.is_none());
        assert!(notes[0].created_at.is_none());
        assert!(payload.categories.is_none());
        assert!(payload.settings.is_none());
    }

    #[test]
    fn parse_import_rejects_bad_json() {
        assert!(matches!(parse_import("{not json"), Err(Error::Format(_))));
        assert!(matches!(
            parse_import(r#"{"notes":[{"title":"missing id"}]}"#),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn parse_import_rejects_blank_ids() {
        assert!(matches!(
            parse_import(r#"{"notes":[{"id":"  "}]}"#),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            parse_import(r#"{"categories":[{"id":"","label":"x"}]}"#),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn imported_note_keeps_stored_fields_it_leaves_out() {
        let mut stored = Note::new("Old", "keep me", "default");
        stored.id = "n1".to_string();
        stored.created_at = Some(5);
        stored.updated_at = Some(6);

        let incoming = ImportedNote {
            id: "n1".to_string(),
            title: Some("New".to_string()),
            category: Some("  ".to_string()),
            ..ImportedNote::default()
        };
        let merged = incoming.merge_into(Some(stored.clone()), "other", 100);

        assert_eq!(merged.title, "New");
        assert_eq!(merged.body, "keep me");
        assert_eq!(merged.category, "default");
        assert_eq!(merged.attachments, stored.attachments);
        assert_eq!(merged.created_at, Some(5));
        assert_eq!(merged.updated_at, Some(100));
    }

    #[test]
    fn imported_note_without_match_is_filled_in() {
        let incoming = ImportedNote {
            id: "n9".to_string(),
            created_at: Some(7),
            ..ImportedNote::default()
        };
        let note = incoming.merge_into(None, "inbox", 100);

        assert_eq!(note.id, "n9");
        assert_eq!(note.category, "inbox");
        assert_eq!(note.created_at, Some(7));
        assert_eq!(note.updated_at, Some(7));

        let bare = ImportedNote {
            id: "n10".to_string(),
            ..ImportedNote::default()
        };
        let note = bare.merge_into(None, "inbox", 100);
        assert_eq!((note.created_at, note.updated_at), (Some(100), Some(100)));
    }
}
