//! Storage layer for Snapnote

mod category_repository;
mod connection;
mod import;
mod migrations;
mod repository;
mod settings_repository;

pub use category_repository::{CategoryRemoval, CategoryRepository, SqliteCategoryRepository};
pub use connection::Database;
pub use import::{export_snapshot, overwrite_data, ImportSummary};
pub use repository::{NoteRepository, SqliteNoteRepository};
pub use settings_repository::{SettingsRepository, SqliteSettingsRepository};
