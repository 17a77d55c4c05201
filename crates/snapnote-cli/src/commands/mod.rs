pub mod add;
pub mod category;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod export;
pub mod import;
pub mod list;
pub mod search;
pub mod show;
