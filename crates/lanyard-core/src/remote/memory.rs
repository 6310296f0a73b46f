//! In-process remote store

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::{InboundRow, OutboundRow, RemoteError, RemoteResult, RemoteStore};
use crate::auth::Principal;
use crate::sync::{SyncRecord, Table};

type Rows = BTreeMap<String, Value>;

#[derive(Default)]
struct State {
    tables: HashMap<(Table, String), Rows>,
    failing_upserts: HashSet<Table>,
    failing_selects: HashSet<Table>,
}

/// Remote store kept in memory as JSON rows, scoped per owner.
///
/// Rows go through the same wire serialization as the HTTP remote, so what is
/// stored here is exactly what would have been sent. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<State>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RemoteResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| RemoteError::Api("memory remote lock poisoned".to_string()))
    }

    /// Raw rows stored for `owner`, ordered by id
    pub fn rows(&self, table: Table, owner: &str) -> Vec<Value> {
        self.lock()
            .map(|state| {
                state
                    .tables
                    .get(&(table, owner.to_string()))
                    .map(|rows| rows.values().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Raw row by id
    pub fn row(&self, table: Table, owner: &str, id: &str) -> Option<Value> {
        self.lock().ok().and_then(|state| {
            state
                .tables
                .get(&(table, owner.to_string()))
                .and_then(|rows| rows.get(id).cloned())
        })
    }

    /// Store a record as if another device had pushed it
    pub fn seed<T: SyncRecord>(&self, owner: &Principal, record: &T) -> RemoteResult<()> {
        let value = serde_json::to_value(OutboundRow::new(record, owner))
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))?;
        let mut state = self.lock()?;
        state
            .tables
            .entry((T::TABLE, owner.id.clone()))
            .or_default()
            .insert(record.id().to_string(), value);
        Ok(())
    }

    /// Make every upsert into `table` fail until switched back
    pub fn fail_upserts(&self, table: Table, failing: bool) {
        if let Ok(mut state) = self.lock() {
            if failing {
                state.failing_upserts.insert(table);
            } else {
                state.failing_upserts.remove(&table);
            }
        }
    }

    /// Make every fetch of `table` fail until switched back
    pub fn fail_selects(&self, table: Table, failing: bool) {
        if let Ok(mut state) = self.lock() {
            if failing {
                state.failing_selects.insert(table);
            } else {
                state.failing_selects.remove(&table);
            }
        }
    }
}

impl RemoteStore for MemoryRemote {
    async fn upsert<T: SyncRecord>(
        &self,
        principal: &Principal,
        rows: &[OutboundRow<'_, T>],
    ) -> RemoteResult<()> {
        let encoded = rows
            .iter()
            .map(|row| {
                serde_json::to_value(row)
                    .map(|value| (row.record.id().to_string(), value))
                    .map_err(|error| RemoteError::InvalidPayload(error.to_string()))
            })
            .collect::<RemoteResult<Vec<_>>>()?;

        let mut state = self.lock()?;
        if state.failing_upserts.contains(&T::TABLE) {
            return Err(RemoteError::Api(format!(
                "upsert into {} rejected (503)",
                T::TABLE
            )));
        }

        let table = state
            .tables
            .entry((T::TABLE, principal.id.clone()))
            .or_default();
        table.extend(encoded);
        Ok(())
    }

    async fn select_all<T: SyncRecord>(&self, principal: &Principal) -> RemoteResult<Vec<T>> {
        let values = {
            let state = self.lock()?;
            if state.failing_selects.contains(&T::TABLE) {
                return Err(RemoteError::Api(format!(
                    "select from {} failed (503)",
                    T::TABLE
                )));
            }
            state
                .tables
                .get(&(T::TABLE, principal.id.clone()))
                .map(|rows| rows.values().cloned().collect::<Vec<_>>())
                .unwrap_or_default()
        };

        values
            .into_iter()
            .map(|value| {
                serde_json::from_value::<InboundRow<T>>(value)
                    .map(|row| row.record)
                    .map_err(|error| RemoteError::InvalidPayload(error.to_string()))
            })
            .collect()
    }
}
