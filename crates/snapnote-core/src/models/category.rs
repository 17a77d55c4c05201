//! Category model

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{generate_id, unix_millis_now};

/// ID of the built-in category new notes land in.
pub const DEFAULT_CATEGORY_ID: &str = "default";

/// Label of the built-in category.
pub const DEFAULT_CATEGORY_LABEL: &str = "默认分类";

/// A category for organizing notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier
    pub id: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Creation timestamp (Unix ms)
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl Category {
    /// Create a new category with a generated ID.
    ///
    /// The label is trimmed and must not be empty.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into().trim().to_string();
        if label.is_empty() {
            return Err(Error::Validation(
                "Category label cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id: generate_id("cat"),
            label,
            created_at: Some(unix_millis_now()),
        })
    }
}

/// The built-in category list.
pub fn default_categories() -> Vec<Category> {
    vec![Category {
        id: DEFAULT_CATEGORY_ID.to_string(),
        label: DEFAULT_CATEGORY_LABEL.to_string(),
        created_at: None,
    }]
}

/// Guarantee at least one category exists.
///
/// Returns `categories` unchanged unless it is empty, in which case the
/// built-in defaults are returned.
pub fn ensure_categories(categories: Vec<Category>) -> Vec<Category> {
    if categories.is_empty() {
        default_categories()
    } else {
        categories
    }
}
