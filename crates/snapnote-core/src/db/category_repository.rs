//! Category repository implementation

use crate::error::{Error, Result};
use crate::models::{default_categories, Category};
use rusqlite::{params, Connection, OptionalExtension};

/// Outcome of a category delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRemoval {
    /// The category is gone; `moved` notes were reassigned
    Removed { moved: usize },
    /// Notes still use the category and the delete was not forced
    Blocked { usage: usize },
}

/// Trait for category storage operations
pub trait CategoryRepository {
    /// List categories in insertion order
    fn list(&self) -> Result<Vec<Category>>;

    /// Get a category by ID
    fn get(&self, id: &str) -> Result<Option<Category>>;

    /// Create a category from a label, or return the existing category
    /// whose label matches case-insensitively
    fn create(&self, label: &str) -> Result<Category>;

    /// Change a category's label; labels stay unique case-insensitively
    fn rename(&self, id: &str, label: &str) -> Result<Category>;

    /// Delete a category, moving its notes to the first remaining category.
    ///
    /// A category that notes still use is only removed with `force`.
    fn delete(&self, id: &str, force: bool) -> Result<CategoryRemoval>;

    /// Insert or overwrite a category keyed by ID
    fn upsert(&self, category: &Category) -> Result<()>;

    /// Remove every category
    fn delete_all(&self) -> Result<usize>;

    /// Re-seed the built-in categories when none exist
    fn ensure_default(&self) -> Result<Vec<Category>>;
}

/// `SQLite` implementation of `CategoryRepository`
pub struct SqliteCategoryRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCategoryRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn find_by_label(&self, label: &str, except_id: Option<&str>) -> Result<Option<Category>> {
        let wanted = label.to_lowercase();
        Ok(self.list()?.into_iter().find(|category| {
            Some(category.id.as_str()) != except_id && category.label.to_lowercase() == wanted
        }))
    }

    fn usage(&self, id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE category = ?",
            params![id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn parse_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            label: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn list(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, label, created_at FROM categories ORDER BY rowid")?;
        let categories = stmt
            .query_map([], Self::parse_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn get(&self, id: &str) -> Result<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, label, created_at FROM categories WHERE id = ?",
                params![id],
                Self::parse_category,
            )
            .optional()?;
        Ok(category)
    }

    fn create(&self, label: &str) -> Result<Category> {
        let category = Category::new(label)?;
        if let Some(existing) = self.find_by_label(&category.label, None)? {
            return Ok(existing);
        }
        self.upsert(&category)?;
        tracing::debug!("Created category {} ({})", category.id, category.label);
        Ok(category)
    }

    fn rename(&self, id: &str, label: &str) -> Result<Category> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::Validation(
                "Category label cannot be empty".to_string(),
            ));
        }
        let Some(mut category) = self.get(id)? else {
            return Err(Error::NotFound(id.to_string()));
        };
        if self.find_by_label(label, Some(id))?.is_some() {
            return Err(Error::Validation(format!(
                "Category label already exists: {label}"
            )));
        }

        category.label = label.to_string();
        self.upsert(&category)?;
        Ok(category)
    }

    fn delete(&self, id: &str, force: bool) -> Result<CategoryRemoval> {
        if self.get(id)?.is_none() {
            return Err(Error::NotFound(id.to_string()));
        }

        let usage = self.usage(id)?;
        if usage > 0 && !force {
            return Ok(CategoryRemoval::Blocked { usage });
        }

        self.conn
            .execute("DELETE FROM categories WHERE id = ?", params![id])?;

        let remaining = self.ensure_default()?;
        let Some(fallback) = remaining.first() else {
            return Ok(CategoryRemoval::Removed { moved: 0 });
        };

        let moved = self.conn.execute(
            "UPDATE notes SET category = ? WHERE category = ?",
            params![fallback.id, id],
        )?;
        if moved > 0 {
            tracing::info!("Moved {moved} notes from {id} to {}", fallback.id);
        }
        Ok(CategoryRemoval::Removed { moved })
    }

    fn upsert(&self, category: &Category) -> Result<()> {
        self.conn.execute(
            "INSERT INTO categories (id, label, created_at) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                created_at = excluded.created_at",
            params![category.id, category.label, category.created_at],
        )?;
        Ok(())
    }

    fn delete_all(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM categories", [])?)
    }

    fn ensure_default(&self) -> Result<Vec<Category>> {
        let categories = self.list()?;
        if !categories.is_empty() {
            return Ok(categories);
        }

        let defaults = default_categories();
        for category in &defaults {
            self.upsert(category)?;
        }
        Ok(defaults)
    }
}
