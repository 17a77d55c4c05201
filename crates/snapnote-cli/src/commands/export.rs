use std::path::{Path, PathBuf};

use snapnote_core::backup::render_backup;
use snapnote_core::db::{export_snapshot, Database, NoteRepository, SqliteNoteRepository};
use snapnote_core::export::{
    build_docx_archive, build_docx_export, build_markdown_archive, build_markdown_export,
    docx_file_name, suggested_export_file_name, ExportFormat,
};
use snapnote_core::util::unix_millis_now;
use snapnote_core::Note;

use crate::commands::common::{normalize_note_identifier, open_database, resolve_note, write_output};
use crate::config::CliConfig;
use crate::error::CliError;

/// Run an export and return the file written, if any.
pub fn run_export(
    format: ExportFormat,
    ids: &[String],
    output_path: Option<&Path>,
    config: &CliConfig,
    db_path: &Path,
) -> Result<Option<PathBuf>, CliError> {
    let db = open_database(db_path)?;
    let notes = select_notes(ids, &db)?;
    tracing::debug!("Exporting {} notes as {format:?}", notes.len());

    match format {
        ExportFormat::Markdown => emit_text(&build_markdown_export(&notes), output_path),
        ExportFormat::Json => {
            let mut snapshot = export_snapshot(&db)?;
            if !ids.is_empty() {
                snapshot.notes = notes;
            }
            emit_text(&render_backup(&snapshot)?, output_path)
        }
        ExportFormat::Docx => {
            let [note] = notes.as_slice() else {
                return Err(CliError::InvalidSelection(format!(
                    "DOCX export needs exactly one note, got {}; select one with --id",
                    notes.len()
                )));
            };
            let package = build_docx_export(note)?;
            report_dropped_images(package.dropped_images);
            let path = output_path.map_or_else(
                || config.export_dir().join(docx_file_name(note)),
                Path::to_path_buf,
            );
            emit_binary(&package.bytes, path)
        }
        ExportFormat::Zip => {
            let bytes = build_markdown_archive(&notes, Vec::new())?;
            emit_binary(&bytes, default_binary_path(format, output_path, config))
        }
        ExportFormat::DocxZip => {
            let archive = build_docx_archive(&notes)?;
            report_dropped_images(archive.dropped_images);
            emit_binary(&archive.bytes, default_binary_path(format, output_path, config))
        }
    }
}

/// Notes named by `ids` in order without repeats, or every note when none are given.
fn select_notes(ids: &[String], db: &Database) -> Result<Vec<Note>, CliError> {
    if ids.is_empty() {
        return Ok(SqliteNoteRepository::new(db.connection()).list_all()?);
    }

    let mut notes: Vec<Note> = Vec::with_capacity(ids.len());
    for id in ids {
        let note = resolve_note(&normalize_note_identifier(id)?, db)?;
        if !notes.iter().any(|existing| existing.id == note.id) {
            notes.push(note);
        }
    }
    Ok(notes)
}

fn default_binary_path(
    format: ExportFormat,
    output_path: Option<&Path>,
    config: &CliConfig,
) -> PathBuf {
    output_path.map_or_else(
        || {
            config
                .export_dir()
                .join(suggested_export_file_name(format, unix_millis_now()))
        },
        Path::to_path_buf,
    )
}

fn emit_text(rendered: &str, output_path: Option<&Path>) -> Result<Option<PathBuf>, CliError> {
    if let Some(path) = output_path {
        write_output(path, rendered.as_bytes())?;
        println!("{}", path.display());
        Ok(Some(path.to_path_buf()))
    } else {
        println!("{rendered}");
        Ok(None)
    }
}

fn emit_binary(bytes: &[u8], path: PathBuf) -> Result<Option<PathBuf>, CliError> {
    write_output(&path, bytes)?;
    println!("{}", path.display());
    Ok(Some(path))
}

fn report_dropped_images(dropped: usize) {
    if dropped > 0 {
        tracing::warn!("{dropped} attachments could not be decoded and were left out");
        eprintln!("Warning: skipped {dropped} unreadable attachment(s)");
    }
}
