use std::path::{Path, PathBuf};

use snapnote_core::db::{
    CategoryRepository, Database, NoteRepository, SettingsRepository, SqliteCategoryRepository,
    SqliteNoteRepository, SqliteSettingsRepository,
};
use snapnote_core::{NewNote, Note};

use crate::commands::common::{load_image_attachment, open_database, resolve_note_body};
use crate::config::CliConfig;
use crate::error::CliError;

pub struct AddOptions<'a> {
    pub body: &'a [String],
    pub title: Option<&'a str>,
    pub category: Option<&'a str>,
    pub images: &'a [PathBuf],
}

pub fn run_add(options: &AddOptions<'_>, config: &CliConfig, db_path: &Path) -> Result<(), CliError> {
    let title = options.title.map(str::trim).unwrap_or_default();
    let has_other_content = !title.is_empty() || !options.images.is_empty();
    let body = resolve_note_body(options.body, has_other_content)?.unwrap_or_default();

    let images = options
        .images
        .iter()
        .map(|path| load_image_attachment(path))
        .collect::<Result<Vec<_>, _>>()?;

    let db = open_database(db_path)?;
    let category = resolve_category(options.category, config, &db)?;
    let note = create_note(
        &db,
        NewNote {
            title: title.to_string(),
            body,
            category,
            images,
        },
    )?;

    println!("{}", note.id);
    Ok(())
}

pub fn create_note(db: &Database, input: NewNote) -> Result<Note, CliError> {
    if input.title.trim().is_empty() && input.body.trim().is_empty() && input.images.is_empty() {
        return Err(CliError::EmptyContent);
    }
    Ok(SqliteNoteRepository::new(db.connection()).create(input)?)
}

/// Category for a new note: the flag, then the CLI config, then stored settings.
pub fn resolve_category(
    explicit: Option<&str>,
    config: &CliConfig,
    db: &Database,
) -> Result<String, CliError> {
    let category = match explicit.map(str::trim).filter(|value| !value.is_empty()) {
        Some(category) => category.to_string(),
        None => match &config.default_category {
            Some(category) => category.clone(),
            None => {
                SqliteSettingsRepository::new(db.connection())
                    .load()?
                    .default_category
            }
        },
    };

    if SqliteCategoryRepository::new(db.connection())
        .get(&category)?
        .is_none()
    {
        return Err(CliError::UnknownCategory(category));
    }
    Ok(category)
}
