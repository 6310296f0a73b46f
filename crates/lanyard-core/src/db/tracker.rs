//! Record CRUD on top of the local store.
//!
//! Every create and edit goes through here so that the record is marked
//! dirty and picked up by the next push.

use crate::error::Result;
use crate::models::{Booth, Contact, RecordId, Session, SyncStatus};
use crate::sync::{SyncRecord, Table};

use super::LocalStore;

/// App-facing service for sessions, booths and contacts
pub struct Tracker<L> {
    store: L,
}

impl<L: LocalStore> Tracker<L> {
    pub const fn new(store: L) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &L {
        &self.store
    }

    /// Save a new record as dirty, whatever status it carried
    pub async fn create<T: SyncRecord>(&self, mut record: T) -> Result<T> {
        record.set_status(SyncStatus::Dirty);
        self.store.add(&record).await?;
        tracing::debug!("Created {} {}", T::TABLE, record.id().short());
        Ok(record)
    }

    pub async fn get<T: SyncRecord>(&self, id: &RecordId) -> Result<Option<T>> {
        self.store.get(id).await
    }

    /// Mutate a stored record and mark it dirty
    pub async fn edit<T, F>(&self, id: &RecordId, apply: F) -> Result<T>
    where
        T: SyncRecord,
        F: FnOnce(&mut T) + Send,
    {
        let record = self
            .store
            .update(id, |record: &mut T| {
                apply(record);
                record.set_status(SyncStatus::Dirty);
            })
            .await?;
        tracing::debug!("Edited {} {}", T::TABLE, id.short());
        Ok(record)
    }

    /// Remove a record from this device.
    ///
    /// Deletions are not synchronized: the remote copy is left in place and a
    /// later pull will bring the record back.
    pub async fn delete<T: SyncRecord>(&self, id: &RecordId) -> Result<()> {
        self.store.delete::<T>(id).await?;
        tracing::debug!("Deleted {} {} locally", T::TABLE, id.short());
        Ok(())
    }

    /// Sessions, most recent first
    pub async fn sessions(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self.store.list().await?;
        sessions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions)
    }

    /// Booths by company name
    pub async fn booths(&self) -> Result<Vec<Booth>> {
        let mut booths: Vec<Booth> = self.store.list().await?;
        booths.sort_by_cached_key(|booth| (booth.company.to_lowercase(), booth.id.clone()));
        Ok(booths)
    }

    /// Contacts by name
    pub async fn contacts(&self) -> Result<Vec<Contact>> {
        let mut contacts: Vec<Contact> = self.store.list().await?;
        contacts.sort_by_cached_key(|contact| (contact.name.to_lowercase(), contact.id.clone()));
        Ok(contacts)
    }

    /// Records whose ID starts with `prefix`
    pub async fn find_by_prefix<T: SyncRecord>(&self, prefix: &str) -> Result<Vec<T>> {
        let prefix = prefix.trim();
        let records: Vec<T> = self.store.list().await?;
        Ok(records
            .into_iter()
            .filter(|record| record.id().as_str().starts_with(prefix))
            .collect())
    }

    /// Number of dirty records per table, in sync order
    pub async fn pending_counts(&self) -> Result<Vec<(Table, usize)>> {
        let sessions = self
            .store
            .list_by_status::<Session>(SyncStatus::Dirty)
            .await?;
        let booths = self.store.list_by_status::<Booth>(SyncStatus::Dirty).await?;
        let contacts = self
            .store
            .list_by_status::<Contact>(SyncStatus::Dirty)
            .await?;

        Ok(vec![
            (Table::Sessions, sessions.len()),
            (Table::Booths, booths.len()),
            (Table::Connections, contacts.len()),
        ])
    }
}
