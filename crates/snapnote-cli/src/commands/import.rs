use std::path::Path;

use snapnote_core::backup::parse_import;
use snapnote_core::db::{overwrite_data, ImportSummary};

use crate::commands::common::open_database;
use crate::error::CliError;

pub fn run_import(path: &Path, replace: bool, db_path: &Path) -> Result<ImportSummary, CliError> {
    let raw = std::fs::read_to_string(path)?;
    let payload = parse_import(&raw)?;

    let mut db = open_database(db_path)?;
    let summary = overwrite_data(&mut db, &payload, replace)?;

    println!(
        "Imported {} notes and {} categories{}",
        summary.notes,
        summary.categories,
        if summary.settings_updated {
            " with settings"
        } else {
            ""
        }
    );
    if summary.skipped_categories > 0 {
        eprintln!(
            "Skipped {} categories without a label",
            summary.skipped_categories
        );
    }
    Ok(summary)
}
