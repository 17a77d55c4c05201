//! Database connection management

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

use super::category_repository::{CategoryRepository, SqliteCategoryRepository};
use super::migrations;

/// Database wrapper for a `SQLite` connection
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations and seeds the built-in categories automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!("Opened database at {}", path.display());
        Self::initialize(conn)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        let database = Self { conn };
        database.configure()?;
        migrations::run(&database.conn)?;
        SqliteCategoryRepository::new(&database.conn).ensure_default()?;
        Ok(database)
    }

    /// Configure `SQLite` pragmas
    fn configure(&self) -> Result<()> {
        // In-memory databases report "memory" instead of switching to WAL
        self.conn.execute_batch("PRAGMA journal_mode = WAL;").ok();
        self.conn.execute_batch("PRAGMA synchronous = NORMAL;").ok();
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get a mutable reference to the underlying connection (for transactions)
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory_seeds_categories() {
        let db = Database::open_in_memory().unwrap();
        let categories = SqliteCategoryRepository::new(db.connection()).list().unwrap();
        assert_eq!(categories.len(), 1);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("snapnote.db");

        let db = Database::open(&path).unwrap();
        assert!(path.exists());

        let one: i32 = db
            .connection()
            .query_row("SELECT 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("snapnote.db");

        {
            let db = Database::open(&path).unwrap();
            SqliteCategoryRepository::new(db.connection())
                .create("Reading")
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let categories = SqliteCategoryRepository::new(db.connection()).list().unwrap();
        assert_eq!(categories.len(), 2);
    }
}
