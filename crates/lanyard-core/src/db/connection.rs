//! Database connection management

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

use super::migrations;

/// Local `SQLite` database holding the offline copy of every table
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!("Opened local database at {}", path.display());
        Self::init(conn)
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let mut database = Self { conn };
        database.configure()?;
        migrations::run(&mut database.conn)?;
        Ok(database)
    }

    /// Configure `SQLite` for optimal performance
    fn configure(&self) -> Result<()> {
        // journal_mode returns a row, and in-memory databases answer "memory"
        match self
            .conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get::<_, String>(0))
        {
            Ok(mode) if mode.eq_ignore_ascii_case("wal") || mode == "memory" => {}
            Ok(mode) => tracing::debug!(%mode, "WAL not available, keeping journal mode"),
            Err(error) => tracing::debug!("Could not set WAL journal mode: {error}"),
        }
        self.conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = 10000;",
        )?;
        Ok(())
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Mutable access, needed for transactions
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let value: i64 = db
            .connection()
            .query_row("SELECT 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(value, 1);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("lanyard.db");

        Database::open(&path).unwrap();
        assert!(path.exists());

        // Reopening runs migrations again without error
        Database::open(&path).unwrap();
    }

    #[test]
    fn test_file_database_uses_wal() {
        let tmp = tempdir().unwrap();
        let db = Database::open(tmp.path().join("lanyard.db")).unwrap();

        let mode: String = db
            .connection()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
    }
}
