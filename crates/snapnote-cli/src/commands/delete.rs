use std::path::Path;

use snapnote_core::db::{NoteRepository, SqliteNoteRepository};

use crate::commands::common::{normalize_note_identifier, open_database, resolve_note};
use crate::error::CliError;

pub fn run_delete(id: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let db = open_database(db_path)?;
    let note = resolve_note(&normalized_id, &db)?;

    SqliteNoteRepository::new(db.connection()).delete(&note.id)?;
    println!("{}", note.id);
    Ok(())
}
