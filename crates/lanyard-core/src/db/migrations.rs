//! Database migrations

use crate::error::Result;
use crate::sync::Table;
use rusqlite::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Migration to version 1: one table per synced collection.
///
/// Payload fields live in a JSON column holding exactly the wire shape; the
/// sync status and the local-only attachment get columns of their own.
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    let mut statements = vec![
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )"
        .to_string(),
    ];

    for table in Table::ALL {
        let name = table.name();
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {name} (
                id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                dirty INTEGER NOT NULL DEFAULT 1,
                audio BLOB
            )"
        ));
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{name}_dirty ON {name}(dirty)"
        ));
    }
    statements.push("INSERT INTO schema_version (version) VALUES (1)".to_string());

    // Dropping the transaction without commit rolls back
    let tx = conn.transaction()?;
    for statement in &statements {
        tx.execute(statement, [])?;
    }
    tx.commit()?;

    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_migrations() {
        let mut conn = setup();
        run(&mut conn).unwrap();

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let mut conn = setup();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap(); // Should not fail

        let version = get_version(&conn).unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migration_v1_creates_every_table() {
        let mut conn = setup();
        run(&mut conn).unwrap();

        for table in Table::ALL {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(
                        SELECT 1 FROM sqlite_master
                        WHERE type = 'table' AND name = ?
                    )",
                    [table.name()],
                    |row| row.get(0),
                )
                .unwrap();
            assert!(exists, "missing table {table}");
        }
    }
}
