//! Local offline store

use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{RecordId, SyncStatus};
use crate::sync::SyncRecord;

/// Key-addressed collection interface over every synced table.
///
/// Methods are generic over the record type; the table is picked from
/// [`SyncRecord::TABLE`], so there is no string-keyed lookup at runtime.
#[allow(async_fn_in_trait)]
pub trait LocalStore {
    /// Get a record by ID
    async fn get<T: SyncRecord>(&self, id: &RecordId) -> Result<Option<T>>;

    /// Insert a new record; fails with `AlreadyExists` if the ID is taken
    async fn add<T: SyncRecord>(&self, record: &T) -> Result<()>;

    /// Apply `apply` to the stored record and write it back
    async fn update<T, F>(&self, id: &RecordId, apply: F) -> Result<T>
    where
        T: SyncRecord,
        F: FnOnce(&mut T) + Send;

    /// Remove a record; fails with `NotFound` if it does not exist
    async fn delete<T: SyncRecord>(&self, id: &RecordId) -> Result<()>;

    /// Every record in the table
    async fn list<T: SyncRecord>(&self) -> Result<Vec<T>>;

    /// Records with the given sync status
    async fn list_by_status<T: SyncRecord>(&self, status: SyncStatus) -> Result<Vec<T>>;

    /// Insert-or-replace by ID, as one atomic write
    async fn bulk_put<T: SyncRecord>(&self, records: &[T]) -> Result<()>;

    /// Write each `(expected, record)` pair only while the stored row still
    /// equals `expected`; `None` means the row must still be absent.
    ///
    /// Runs as one atomic write. Returns the IDs whose row had changed; those
    /// rows are left untouched.
    async fn put_if_unchanged<T: SyncRecord>(
        &self,
        writes: &[(Option<T>, T)],
    ) -> Result<Vec<RecordId>>;
}

/// `SQLite` implementation of `LocalStore`, shareable across tasks
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open (and migrate) the database file at `path`
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Open an in-memory store (primarily for tests)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

struct StoredRow {
    payload: String,
    dirty: i64,
    audio: Option<Vec<u8>>,
}

impl StoredRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            payload: row.get(0)?,
            dirty: row.get(1)?,
            audio: row.get(2)?,
        })
    }

    fn decode<T: SyncRecord>(self) -> Result<T> {
        let mut record: T = serde_json::from_str(&self.payload)?;
        record.set_status(SyncStatus::from_flag(self.dirty));
        record.set_attachment(self.audio);
        Ok(record)
    }
}

fn select_one<T: SyncRecord>(conn: &Connection, id: &RecordId) -> Result<Option<T>> {
    let sql = format!(
        "SELECT payload, dirty, audio FROM {} WHERE id = ?",
        T::TABLE.name()
    );
    conn.query_row(&sql, params![id.as_str()], StoredRow::read)
        .optional()?
        .map(StoredRow::decode)
        .transpose()
}

fn select_many<T: SyncRecord>(conn: &Connection, status: Option<SyncStatus>) -> Result<Vec<T>> {
    let table = T::TABLE.name();
    let rows = if let Some(status) = status {
        let mut stmt = conn.prepare(&format!(
            "SELECT payload, dirty, audio FROM {table} WHERE dirty = ? ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![status.as_flag()], StoredRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    } else {
        let mut stmt = conn.prepare(&format!(
            "SELECT payload, dirty, audio FROM {table} ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([], StoredRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    rows.into_iter().map(StoredRow::decode).collect()
}

fn upsert<T: SyncRecord>(conn: &Connection, record: &T) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (id, payload, dirty, audio) VALUES (?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
            payload = excluded.payload,
            dirty = excluded.dirty,
            audio = excluded.audio",
        T::TABLE.name()
    );
    conn.execute(
        &sql,
        params![
            record.id().as_str(),
            serde_json::to_string(record)?,
            record.status().as_flag(),
            record.attachment()
        ],
    )?;
    Ok(())
}

/// Whether the stored row carries the same payload and attachment as `expected`
fn is_unchanged<T: SyncRecord>(
    conn: &Connection,
    id: &RecordId,
    expected: Option<&T>,
) -> Result<bool> {
    let sql = format!(
        "SELECT payload, audio FROM {} WHERE id = ?",
        T::TABLE.name()
    );
    let stored: Option<(String, Option<Vec<u8>>)> = conn
        .query_row(&sql, params![id.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()?;

    match (stored, expected) {
        (None, None) => Ok(true),
        (Some((payload, audio)), Some(expected)) => {
            let stored: serde_json::Value = serde_json::from_str(&payload)?;
            Ok(stored == serde_json::to_value(expected)?
                && audio.as_deref() == expected.attachment())
        }
        _ => Ok(false),
    }
}

fn exists<T: SyncRecord>(conn: &Connection, id: &RecordId) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)",
        T::TABLE.name()
    );
    Ok(conn.query_row(&sql, params![id.as_str()], |row| row.get(0))?)
}

fn not_found<T: SyncRecord>(id: &RecordId) -> Error {
    Error::NotFound {
        table: T::TABLE,
        id: id.to_string(),
    }
}

impl LocalStore for SqliteStore {
    async fn get<T: SyncRecord>(&self, id: &RecordId) -> Result<Option<T>> {
        let db = self.db.lock().await;
        select_one(db.connection(), id)
    }

    async fn add<T: SyncRecord>(&self, record: &T) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();
        if exists::<T>(conn, record.id())? {
            return Err(Error::AlreadyExists {
                table: T::TABLE,
                id: record.id().to_string(),
            });
        }
        upsert(conn, record)
    }

    async fn update<T, F>(&self, id: &RecordId, apply: F) -> Result<T>
    where
        T: SyncRecord,
        F: FnOnce(&mut T) + Send,
    {
        let db = self.db.lock().await;
        let conn = db.connection();
        let mut record: T = select_one(conn, id)?.ok_or_else(|| not_found::<T>(id))?;

        apply(&mut record);
        if record.id() != id {
            return Err(Error::InvalidInput(format!(
                "Record ID cannot change during update ({id} -> {})",
                record.id()
            )));
        }

        upsert(conn, &record)?;
        Ok(record)
    }

    async fn delete<T: SyncRecord>(&self, id: &RecordId) -> Result<()> {
        let db = self.db.lock().await;
        let rows = db.connection().execute(
            &format!("DELETE FROM {} WHERE id = ?", T::TABLE.name()),
            params![id.as_str()],
        )?;

        if rows == 0 {
            return Err(not_found::<T>(id));
        }
        Ok(())
    }

    async fn list<T: SyncRecord>(&self) -> Result<Vec<T>> {
        let db = self.db.lock().await;
        select_many(db.connection(), None)
    }

    async fn list_by_status<T: SyncRecord>(&self, status: SyncStatus) -> Result<Vec<T>> {
        let db = self.db.lock().await;
        select_many(db.connection(), Some(status))
    }

    async fn bulk_put<T: SyncRecord>(&self, records: &[T]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut db = self.db.lock().await;
        let tx = db.connection_mut().transaction()?;
        for record in records {
            upsert(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn put_if_unchanged<T: SyncRecord>(
        &self,
        writes: &[(Option<T>, T)],
    ) -> Result<Vec<RecordId>> {
        if writes.is_empty() {
            return Ok(Vec::new());
        }

        let mut db = self.db.lock().await;
        let tx = db.connection_mut().transaction()?;
        let mut changed = Vec::new();
        for (expected, record) in writes {
            if is_unchanged(&tx, record.id(), expected.as_ref())? {
                upsert(&tx, record)?;
            } else {
                changed.push(record.id().clone());
            }
        }
        tx.commit()?;
        Ok(changed)
    }
}
