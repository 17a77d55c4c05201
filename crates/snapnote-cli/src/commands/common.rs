use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use serde::Serialize;
use snapnote_core::db::{Database, NoteRepository, SqliteNoteRepository};
use snapnote_core::{Image, Note};

use crate::error::CliError;

const SHORT_ID_LEN: usize = 18;

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub category: String,
    pub images: usize,
    pub created_at: Option<i64>,
    pub updated_at: i64,
    pub relative_time: String,
}

pub fn open_database(path: &Path) -> Result<Database, CliError> {
    let db = Database::open(path)?;
    tracing::debug!("Using database {}", path.display());
    Ok(db)
}

pub fn list_notes(
    limit: usize,
    category: Option<&str>,
    db_path: &Path,
) -> Result<Vec<Note>, CliError> {
    let db = open_database(db_path)?;
    let repo = SqliteNoteRepository::new(db.connection());
    if let Some(category) = category {
        Ok(repo.list_by_category(category, limit, 0)?)
    } else {
        Ok(repo.list(limit, 0)?)
    }
}

pub fn search_notes(query: &str, limit: usize, db_path: &Path) -> Result<Vec<Note>, CliError> {
    let db = open_database(db_path)?;
    Ok(SqliteNoteRepository::new(db.connection()).search(query, limit)?)
}

/// Find a note by exact ID or by a unique ID prefix.
pub fn resolve_note(note_query: &str, db: &Database) -> Result<Note, CliError> {
    let repo = SqliteNoteRepository::new(db.connection());
    if let Some(note) = repo.get(note_query)? {
        return Ok(note);
    }

    let matching_ids = repo.find_ids_by_prefix(note_query, 3)?;

    match matching_ids.as_slice() {
        [] => Err(CliError::NoteNotFound(note_query.to_string())),
        [id] => repo
            .get(id)?
            .ok_or_else(|| CliError::NoteNotFound(note_query.to_string())),
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let short_id = short_id(&note.id);
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.updated_at_or_fallback(), now_ms);
            let images = note.attachments.images.len();

            if images == 0 {
                format!("{short_id:<18}  {preview:<40}  {relative_time}")
            } else {
                format!("{short_id:<18}  {preview:<40}  {relative_time:<10}  [{images} img]")
            }
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    let updated_at = note.updated_at_or_fallback();

    NoteListItem {
        id: note.id.clone(),
        title: note.display_title().to_string(),
        preview: note_preview(note, 80),
        category: note.category.clone(),
        images: note.attachments.images.len(),
        created_at: note.created_at,
        updated_at,
        relative_time: format_relative_time(updated_at, now_ms),
    }
}

/// One-line summary: the title when set, otherwise the first body line.
pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let source = if note.title.trim().is_empty() {
        note.body_preview(usize::MAX)
    } else {
        note.title.clone()
    };
    let collapsed = source.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Body from arguments, then piped stdin, then `$EDITOR`.
///
/// The editor is skipped when the note already has a title or images.
pub fn resolve_note_body(
    body_parts: &[String],
    has_other_content: bool,
) -> Result<Option<String>, CliError> {
    if let Some(body) = normalize_content(&body_parts.join(" ")) {
        return Ok(Some(body));
    }

    if let Some(body) = read_piped_stdin()? {
        return Ok(Some(body));
    }

    if has_other_content {
        return Ok(None);
    }

    capture_editor_input()?
        .map(Some)
        .ok_or(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Read an image from disk as an attachment, guessing its type from the extension.
pub fn load_image_attachment(path: &Path) -> Result<Image, CliError> {
    let mime = mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .ok_or_else(|| CliError::UnsupportedImage(path.display().to_string()))?;

    let bytes = std::fs::read(path)?;
    tracing::debug!("Attaching {} ({mime}, {} bytes)", path.display(), bytes.len());
    Ok(Image::from_bytes(mime.essence_str(), &bytes, None, None))
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, "")?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            // EDITOR may carry arguments, e.g. "code --wait"
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let status = Command::new(program).args(parts).arg(file_path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("snapnote-{}-{now}.md", std::process::id()))
}

/// Write bytes to `path`, creating parent directories.
pub fn write_output(path: &Path, contents: &[u8]) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, contents)?;
    Ok(())
}
