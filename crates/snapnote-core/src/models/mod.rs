//! Data models for Snapnote

mod attachment;
mod category;
mod note;
mod settings;

pub use attachment::{Attachments, Image};
pub use category::{
    default_categories, ensure_categories, Category, DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_LABEL,
};
pub use note::{NewNote, Note, UNCATEGORIZED, UNTITLED_FILE_STEM, UNTITLED_NOTE};
pub use settings::{PanelPosition, Settings, ThemeMode};
