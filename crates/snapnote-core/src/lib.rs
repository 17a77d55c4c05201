//! snapnote-core - Core library for Snapnote
//!
//! This crate contains the note models, the `SQLite` storage layer, and the
//! self-contained export encoders (store-only ZIP, OOXML/DOCX, Markdown and
//! JSON backups) used by every Snapnote interface.

pub mod backup;
pub mod db;
pub mod docx;
pub mod error;
pub mod export;
pub mod models;
pub mod util;
pub mod zip;

pub use error::{Error, Result};
pub use models::{Attachments, Category, Image, NewNote, Note, Settings};
