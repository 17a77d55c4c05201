//! Bulk import and snapshot helpers

use serde::Serialize;

use crate::backup::{build_backup, BackupPayload, ImportPayload};
use crate::error::Result;
use crate::models::{Category, DEFAULT_CATEGORY_ID};
use crate::util::unix_millis_now;

use super::category_repository::{CategoryRepository, SqliteCategoryRepository};
use super::connection::Database;
use super::repository::{NoteRepository, SqliteNoteRepository};
use super::settings_repository::{SettingsRepository, SqliteSettingsRepository};

/// What an import changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub notes: usize,
    pub categories: usize,
    /// Incoming categories left out because their label was blank
    pub skipped_categories: usize,
    pub settings_updated: bool,
    /// Whether existing notes and categories were cleared first
    pub replaced: bool,
}

/// Write an import payload into the store.
///
/// With `replace` set, existing notes and categories are removed first.
/// Otherwise incoming records are merged by ID: fields an incoming note
/// carries win, the rest keep their stored values. Categories with a blank
/// label are skipped, and notes without a category land in the first one.
/// Runs in a single transaction and always leaves at least one category.
pub fn overwrite_data(
    db: &mut Database,
    payload: &ImportPayload,
    replace: bool,
) -> Result<ImportSummary> {
    let tx = db.connection_mut().transaction()?;
    let mut summary = ImportSummary {
        replaced: replace,
        ..ImportSummary::default()
    };

    {
        let notes = SqliteNoteRepository::new(&tx);
        let categories = SqliteCategoryRepository::new(&tx);

        if replace {
            let removed_notes = notes.delete_all()?;
            let removed_categories = categories.delete_all()?;
            tracing::info!(
                "Cleared {removed_notes} notes and {removed_categories} categories before import"
            );
        }

        for incoming in payload.categories.iter().flatten() {
            let label = incoming.label.trim();
            if label.is_empty() {
                tracing::warn!("Skipping imported category {} without a label", incoming.id);
                summary.skipped_categories += 1;
                continue;
            }

            let stored = categories.get(&incoming.id)?;
            categories.upsert(&Category {
                id: incoming.id.clone(),
                label: label.to_string(),
                created_at: incoming
                    .created_at
                    .or_else(|| stored.and_then(|category| category.created_at)),
            })?;
            summary.categories += 1;
        }

        let fallback_category = categories
            .ensure_default()?
            .into_iter()
            .next()
            .map_or_else(|| DEFAULT_CATEGORY_ID.to_string(), |category| category.id);
        let now = unix_millis_now();

        for incoming in payload.notes.iter().flatten() {
            let stored = notes.get(&incoming.id)?;
            notes.upsert(&incoming.merge_into(stored, &fallback_category, now))?;
            summary.notes += 1;
        }

        if let Some(settings) = &payload.settings {
            SqliteSettingsRepository::new(&tx).save(settings)?;
            summary.settings_updated = true;
        }
    }

    tx.commit()?;
    tracing::info!(
        "Imported {} notes and {} categories (replace: {replace})",
        summary.notes,
        summary.categories
    );
    Ok(summary)
}

/// Capture the whole store as a backup payload.
pub fn export_snapshot(db: &Database) -> Result<BackupPayload> {
    let conn = db.connection();
    let notes = SqliteNoteRepository::new(conn).list_all()?;
    let categories = SqliteCategoryRepository::new(conn).list()?;
    let settings = SqliteSettingsRepository::new(conn).load()?;
    Ok(build_backup(notes, categories, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::{parse_import, render_backup};
    use crate::models::{Attachments, Note, Settings, ThemeMode};

    fn note(id: &str, title: &str) -> Note {
        Note {
            id: id.to_string(),
            title: title.to_string(),
            body: String::new(),
            category: DEFAULT_CATEGORY_ID.to_string(),
            attachments: Attachments::default(),
            created_at: Some(1),
            updated_at: Some(1),
        }
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        let repo = SqliteNoteRepository::new(db.connection());
        repo.upsert(&note("n1", "Old")).unwrap();
        repo.upsert(&note("n2", "Keep")).unwrap();
        db
    }

    #[test]
    fn test_merge_import_updates_and_preserves() {
        let mut db = seeded();
        let payload = parse_import(r#"{"notes":[{"id":"n1","title":"New"}]}"#).unwrap();

        let summary = overwrite_data(&mut db, &payload, false).unwrap();
        assert_eq!(summary.notes, 1);
        assert!(!summary.settings_updated);

        let repo = SqliteNoteRepository::new(db.connection());
        assert_eq!(repo.get("n1").unwrap().unwrap().title, "New");
        assert_eq!(repo.get("n2").unwrap().unwrap().title, "Keep");
        assert_eq!(repo.count().unwrap(), 2);
    }

    #[test]
    fn test_replace_import_clears_existing() {
        let mut db = seeded();
        let payload = parse_import(r#"{"notes":[{"id":"n1","title":"New"}]}"#).unwrap();

        let summary = overwrite_data(&mut db, &payload, true).unwrap();
        assert!(summary.replaced);

        let repo = SqliteNoteRepository::new(db.connection());
        assert_eq!(repo.count().unwrap(), 1);
        assert!(repo.get("n2").unwrap().is_none());

        let categories = SqliteCategoryRepository::new(db.connection()).list().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, DEFAULT_CATEGORY_ID);
    }

    #[test]
    fn test_import_categories_and_settings() {
        let mut db = seeded();
        let payload = ImportPayload {
            notes: None,
            categories: Some(vec![Category {
                id: "work".to_string(),
                label: "Work".to_string(),
                created_at: None,
            }]),
            settings: Some(Settings {
                theme: ThemeMode::Light,
                ..Settings::default()
            }),
        };

        let summary = overwrite_data(&mut db, &payload, true).unwrap();
        assert_eq!(summary.categories, 1);
        assert!(summary.settings_updated);

        let categories = SqliteCategoryRepository::new(db.connection()).list().unwrap();
        let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["work"]);

        let settings = SqliteSettingsRepository::new(db.connection()).load().unwrap();
        assert_eq!(settings.theme, ThemeMode::Light);
    }

    #[test]
    fn test_snapshot_round_trips_into_fresh_store() {
        let db = seeded();
        let snapshot = export_snapshot(&db).unwrap();
        assert_eq!(snapshot.notes.len(), 2);

        let json = render_backup(&snapshot).unwrap();
        let mut fresh = Database::open_in_memory().unwrap();
        overwrite_data(&mut fresh, &parse_import(&json).unwrap(), true).unwrap();

        let restored = export_snapshot(&fresh).unwrap();
        assert_eq!(restored.notes, snapshot.notes);
        assert_eq!(restored.categories, snapshot.categories);
        assert_eq!(restored.settings, snapshot.settings);
    }

    #[test]
    fn test_merge_import_keeps_fields_the_payload_omits() {
        let mut db = Database::open_in_memory().unwrap();
        let repo = SqliteNoteRepository::new(db.connection());
        let mut stored = note("n1", "Old");
        stored.body = "keep me".to_string();
        stored.created_at = Some(5);
        stored.updated_at = Some(5);
        repo.upsert(&stored).unwrap();

        let payload = parse_import(r#"{"notes":[{"id":"n1","title":"New"}]}"#).unwrap();
        overwrite_data(&mut db, &payload, false).unwrap();

        let merged = SqliteNoteRepository::new(db.connection())
            .get("n1")
            .unwrap()
            .unwrap();
        assert_eq!(merged.title, "New");
        assert_eq!(merged.body, "keep me");
        assert_eq!(merged.category, DEFAULT_CATEGORY_ID);
        assert_eq!(merged.created_at, Some(5));
        assert!(merged.updated_at.unwrap() > 5);
    }

    #[test]
    fn test_import_stamps_new_notes_and_skips_blank_categories() {
        let mut db = Database::open_in_memory().unwrap();
        let payload = parse_import(
            r#"{
                "categories": [{"id":"blank","label":"  "}, {"id":"work","label":" Work "}],
                "notes": [{"id":"fresh","body":"hello"}]
            }"#,
        )
        .unwrap();

        let summary = overwrite_data(&mut db, &payload, true).unwrap();
        assert_eq!(summary.categories, 1);
        assert_eq!(summary.skipped_categories, 1);

        let categories = SqliteCategoryRepository::new(db.connection()).list().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, "work");
        assert_eq!(categories[0].label, "Work");

        let fresh = SqliteNoteRepository::new(db.connection())
            .get("fresh")
            .unwrap()
            .unwrap();
        assert_eq!(fresh.body, "hello");
        assert_eq!(fresh.category, "work");
        assert!(fresh.created_at.is_some());
        assert_eq!(fresh.updated_at, fresh.created_at);
    }
}
