//! One sync pass over every table

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::auth::{IdentityProvider, Principal};
use crate::db::LocalStore;
use crate::error::{Error, Result};
use crate::models::{Booth, Contact, Session, SyncStatus};
use crate::remote::{OutboundRow, RemoteStore};
use crate::util::sync_timestamp_now;

use super::{SyncOutcome, SyncRecord, SyncReport, TableReport};

/// Clears the in-flight flag when the pass ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Pushes dirty local records and pulls newer remote ones.
pub struct SyncOrchestrator<L, R, I> {
    local: L,
    remote: R,
    identity: I,
    in_flight: AtomicBool,
}

impl<L, R, I> SyncOrchestrator<L, R, I>
where
    L: LocalStore,
    R: RemoteStore,
    I: IdentityProvider,
{
    pub const fn new(local: L, remote: R, identity: I) -> Self {
        Self {
            local,
            remote,
            identity,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a pass is currently running
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one full pass.
    ///
    /// Remote failures are contained per table and reported; only local store
    /// failures are returned as `Err`.
    pub async fn run_sync(&self) -> Result<SyncReport> {
        let Some(_guard) = RunGuard::acquire(&self.in_flight) else {
            tracing::debug!("Sync already in progress, skipping");
            return Ok(SyncReport::skipped(SyncOutcome::AlreadyRunning));
        };

        let Some(principal) = self.identity.current_user().await else {
            tracing::debug!("Not signed in, skipping sync");
            return Ok(SyncReport::skipped(SyncOutcome::NotAuthenticated));
        };

        let tables = vec![
            self.sync_table::<Session>(&principal).await?,
            self.sync_table::<Booth>(&principal).await?,
            self.sync_table::<Contact>(&principal).await?,
        ];

        let report = SyncReport::completed(tables);
        tracing::debug!(
            pushed = report.total_pushed(),
            adopted = report.total_adopted(),
            clean = report.is_clean(),
            "Sync finished"
        );
        Ok(report)
    }

    async fn sync_table<T: SyncRecord>(&self, principal: &Principal) -> Result<TableReport> {
        let mut report = TableReport::new(T::TABLE);
        self.push::<T>(principal, &mut report).await?;
        self.pull::<T>(principal, &mut report).await?;
        Ok(report)
    }

    async fn push<T: SyncRecord>(&self, principal: &Principal, report: &mut TableReport) -> Result<()> {
        let pending: Vec<T> = self.local.list_by_status(SyncStatus::Dirty).await?;
        if pending.is_empty() {
            return Ok(());
        }

        let stamp = sync_timestamp_now();
        let stamped: Vec<T> = pending
            .iter()
            .cloned()
            .map(|mut record| {
                record.set_updated_at(stamp);
                record
            })
            .collect();

        let pushed = {
            let rows: Vec<_> = stamped
                .iter()
                .map(|record| OutboundRow::new(record, principal))
                .collect();
            self.remote.upsert(principal, &rows).await
        };

        if let Err(error) = pushed {
            tracing::warn!(
                table = %T::TABLE,
                count = pending.len(),
                "Push failed, records stay dirty: {error}"
            );
            report.push_error = Some(error.to_string());
            return Ok(());
        }

        report.pushed = pending.len();
        let writes: Vec<_> = pending
            .into_iter()
            .zip(stamped)
            .map(|(before, mut after)| {
                after.set_status(SyncStatus::Clean);
                (Some(before), after)
            })
            .collect();

        // Rows edited while the upsert was in flight keep their edit and stay
        // dirty. They take the pushed stamp so the pull below cannot win a
        // timestamp comparison against them.
        for id in self.local.put_if_unchanged(&writes).await? {
            tracing::debug!(table = %T::TABLE, %id, "Edited during push, left dirty");
            match self
                .local
                .update::<T, _>(&id, |record| record.set_updated_at(stamp))
                .await
            {
                Ok(_) | Err(Error::NotFound { .. }) => {}
                Err(error) => return Err(error),
            }
        }

        tracing::info!(table = %T::TABLE, count = report.pushed, "Pushed dirty records");
        Ok(())
    }

    async fn pull<T: SyncRecord>(&self, principal: &Principal, report: &mut TableReport) -> Result<()> {
        let incoming: Vec<T> = match self.remote.select_all(principal).await {
            Ok(rows) => rows,
            Err(error) => {
                tracing::warn!(table = %T::TABLE, "Pull failed: {error}");
                report.pull_error = Some(error.to_string());
                return Ok(());
            }
        };

        report.fetched = incoming.len();
        if incoming.is_empty() {
            return Ok(());
        }

        let mut local: HashMap<String, T> = self
            .local
            .list::<T>()
            .await?
            .into_iter()
            .map(|record| (record.id().as_str().to_string(), record))
            .collect();

        let mut adopted = Vec::new();
        for mut remote in incoming {
            let existing = local.remove(remote.id().as_str());
            match &existing {
                None => {
                    tracing::debug!(table = %T::TABLE, id = %remote.id(), "New on remote");
                }
                Some(existing) if remote.updated_at() > existing.updated_at() => {
                    tracing::debug!(table = %T::TABLE, id = %remote.id(), "Remote copy is newer");
                    remote.keep_local_only(existing);
                }
                Some(_) => {
                    report.skipped += 1;
                    continue;
                }
            }
            remote.set_status(SyncStatus::Clean);
            adopted.push((existing, remote));
        }

        let changed = self.local.put_if_unchanged(&adopted).await?;
        for id in &changed {
            tracing::debug!(table = %T::TABLE, %id, "Changed locally during pull, kept");
        }

        report.adopted = adopted.len() - changed.len();
        report.skipped += changed.len();
        tracing::info!(
            table = %T::TABLE,
            fetched = report.fetched,
            adopted = report.adopted,
            skipped = report.skipped,
            "Pulled remote records"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticIdentity;
    use crate::db::SqliteStore;
    use crate::remote::{MemoryRemote, RemoteResult};
    use crate::sync::Table;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    type Orchestrator = SyncOrchestrator<SqliteStore, MemoryRemote, StaticIdentity>;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn owner() -> Principal {
        Principal::new("user-1")
    }

    fn signed_in() -> (Orchestrator, SqliteStore, MemoryRemote) {
        let local = SqliteStore::open_in_memory().unwrap();
        let remote = MemoryRemote::new();
        let orchestrator = SyncOrchestrator::new(
            local.clone(),
            remote.clone(),
            StaticIdentity::signed_in(owner()),
        );
        (orchestrator, local, remote)
    }

    fn clean_session(id: &str, title: &str, updated_at: i64) -> Session {
        let mut session = Session::new(title);
        session.id = id.parse().unwrap();
        session.updated_at = Some(at(updated_at));
        session.status = SyncStatus::Clean;
        session
    }

    #[tokio::test]
    async fn dirty_record_is_pushed_and_marked_clean() {
        let (orchestrator, local, remote) = signed_in();
        let mut session = Session::new("X");
        session.id = "a".parse().unwrap();
        local.add(&session).await.unwrap();

        let report = orchestrator.run_sync().await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.table(Table::Sessions).unwrap().pushed, 1);

        let row = remote.row(Table::Sessions, "user-1", "a").unwrap();
        assert_eq!(row["title"], "X");
        assert_eq!(row["user_id"], "user-1");

        let stored: Session = local.get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SyncStatus::Clean);
        let pushed_at: DateTime<Utc> = row["updated_at"].as_str().unwrap().parse().unwrap();
        assert_eq!(stored.updated_at, Some(pushed_at));
    }

    #[tokio::test]
    async fn newer_remote_replaces_local() {
        let (orchestrator, local, remote) = signed_in();
        local.add(&clean_session("b", "Old", 1000)).await.unwrap();
        remote.seed(&owner(), &clean_session("b", "New", 2000)).unwrap();

        let report = orchestrator.run_sync().await.unwrap();
        assert_eq!(report.table(Table::Sessions).unwrap().adopted, 1);

        let stored: Session = local.get(&"b".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.title, "New");
        assert_eq!(stored.updated_at, Some(at(2000)));
        assert_eq!(stored.status, SyncStatus::Clean);
    }

    #[tokio::test]
    async fn older_remote_is_ignored() {
        let (orchestrator, local, remote) = signed_in();
        local.add(&clean_session("c", "Local", 5000)).await.unwrap();
        remote.seed(&owner(), &clean_session("c", "Remote", 1000)).unwrap();

        let report = orchestrator.run_sync().await.unwrap();
        let sessions = report.table(Table::Sessions).unwrap();
        assert_eq!(sessions.adopted, 0);
        assert_eq!(sessions.skipped, 1);

        let stored: Session = local.get(&"c".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.title, "Local");
        assert_eq!(stored.updated_at, Some(at(5000)));
    }

    #[tokio::test]
    async fn equal_timestamps_keep_local_copy() {
        let (orchestrator, local, remote) = signed_in();
        local.add(&clean_session("d", "Local", 3000)).await.unwrap();
        remote.seed(&owner(), &clean_session("d", "Remote", 3000)).unwrap();

        orchestrator.run_sync().await.unwrap();

        let stored: Session = local.get(&"d".parse().unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.title, "Local");
    }

    #[tokio::test]
    async fn unauthenticated_run_touches_nothing() {
        let local = SqliteStore::open_in_memory().unwrap();
        let remote = MemoryRemote::new();
        let orchestrator =
            SyncOrchestrator::new(local.clone(), remote.clone(), StaticIdentity::anonymous());
        let session = Session::new("Offline");
        local.add(&session).await.unwrap();

        let report = orchestrator.run_sync().await.unwrap();
        assert_eq!(report.outcome, SyncOutcome::NotAuthenticated);

        let stored: Session = local.get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SyncStatus::Dirty);
        assert_eq!(stored.updated_at, None);
        assert!(remote.rows(Table::Sessions, "user-1").is_empty());
    }

    #[tokio::test]
    async fn failed_push_leaves_records_dirty() {
        let (orchestrator, local, remote) = signed_in();
        remote.fail_upserts(Table::Booths, true);
        let mut booth = Booth::new("Acme");
        booth.notes = "hiring".to_string();
        local.add(&booth).await.unwrap();

        let report = orchestrator.run_sync().await.unwrap();
        let booths = report.table(Table::Booths).unwrap();
        assert_eq!(booths.pushed, 0);
        assert!(booths.push_error.is_some());
        assert!(!report.is_clean());

        let stored: Booth = local.get(&booth.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SyncStatus::Dirty);
        assert_eq!(stored.notes, "hiring");
        assert_eq!(stored.updated_at, None);

        remote.fail_upserts(Table::Booths, false);
        let retry = orchestrator.run_sync().await.unwrap();
        assert_eq!(retry.table(Table::Booths).unwrap().pushed, 1);
    }

    #[tokio::test]
    async fn remote_only_record_is_adopted_clean() {
        let (orchestrator, local, remote) = signed_in();
        let mut contact = Contact::new("Grace").with_company("Navy");
        contact.updated_at = Some(at(1000));
        remote.seed(&owner(), &contact).unwrap();

        orchestrator.run_sync().await.unwrap();

        let stored: Contact = local.get(&contact.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Grace");
        assert_eq!(stored.company, "Navy");
        assert_eq!(stored.status, SyncStatus::Clean);
    }

    #[tokio::test]
    async fn audio_stays_local() {
        let (orchestrator, local, remote) = signed_in();
        let mut contact = Contact::new("Ada");
        contact.audio = Some(vec![1, 2, 3, 4]);
        local.add(&contact).await.unwrap();

        orchestrator.run_sync().await.unwrap();

        let row = remote
            .row(Table::Connections, "user-1", contact.id.as_str())
            .unwrap();
        assert!(row.get("audio").is_none());

        let stored: Contact = local.get(&contact.id).await.unwrap().unwrap();
        assert_eq!(stored.audio, Some(vec![1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn adopted_record_keeps_local_audio() {
        let (orchestrator, local, remote) = signed_in();
        let mut session = clean_session("e", "Old", 1000);
        session.audio = Some(vec![5; 8]);
        local.add(&session).await.unwrap();
        remote.seed(&owner(), &clean_session("e", "New", 2000)).unwrap();

        orchestrator.run_sync().await.unwrap();

        let stored: Session = local.get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "New");
        assert_eq!(stored.audio, Some(vec![5; 8]));
    }

    #[tokio::test]
    async fn pull_failure_does_not_stop_later_tables() {
        let (orchestrator, local, remote) = signed_in();
        remote.fail_selects(Table::Sessions, true);
        let mut contact = Contact::new("Linus");
        contact.updated_at = Some(at(1000));
        remote.seed(&owner(), &contact).unwrap();

        let report = orchestrator.run_sync().await.unwrap();
        assert_eq!(report.outcome, SyncOutcome::Completed);
        assert!(report.table(Table::Sessions).unwrap().pull_error.is_some());
        assert_eq!(report.table(Table::Connections).unwrap().adopted, 1);
        assert!(local.get::<Contact>(&contact.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn repeated_push_yields_same_remote_state() {
        let (orchestrator, local, remote) = signed_in();
        let booth = Booth::new("Initech");
        local.add(&booth).await.unwrap();

        orchestrator.run_sync().await.unwrap();
        let first = remote.rows(Table::Booths, "user-1");

        // Re-dirty without changing the payload; the re-push overwrites in place.
        local
            .update::<Booth, _>(&booth.id, |record| record.status = SyncStatus::Dirty)
            .await
            .unwrap();
        orchestrator.run_sync().await.unwrap();
        let second = remote.rows(Table::Booths, "user-1");

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0]["company"], second[0]["company"]);
        assert_eq!(first[0]["id"], second[0]["id"]);
    }

    #[tokio::test]
    async fn second_sync_after_clean_run_changes_nothing() {
        let (orchestrator, local, _remote) = signed_in();
        local.add(&Session::new("Once")).await.unwrap();

        orchestrator.run_sync().await.unwrap();
        let again = orchestrator.run_sync().await.unwrap();

        assert_eq!(again.total_pushed(), 0);
        assert_eq!(again.total_adopted(), 0);
        assert_eq!(again.table(Table::Sessions).unwrap().skipped, 1);
    }

    #[tokio::test]
    async fn failed_push_still_pulls_the_same_table() {
        let (orchestrator, local, remote) = signed_in();
        remote.fail_upserts(Table::Booths, true);
        let pending = Booth::new("Local only");
        local.add(&pending).await.unwrap();
        let mut published = Booth::new("From another device");
        published.updated_at = Some(at(1000));
        remote.seed(&owner(), &published).unwrap();

        let report = orchestrator.run_sync().await.unwrap();
        let booths = report.table(Table::Booths).unwrap();
        assert!(booths.push_error.is_some());
        assert_eq!(booths.pushed, 0);
        assert_eq!(booths.adopted, 1);

        let adopted: Booth = local.get(&published.id).await.unwrap().unwrap();
        assert_eq!(adopted.company, "From another device");
        assert_eq!(adopted.status, SyncStatus::Clean);

        let still_pending: Booth = local.get(&pending.id).await.unwrap().unwrap();
        assert_eq!(still_pending.status, SyncStatus::Dirty);
        assert_eq!(still_pending.updated_at, None);
    }

    /// Lets one local edit land while the session upsert is in flight.
    struct EditDuringUpsert {
        inner: MemoryRemote,
        local: SqliteStore,
        armed: AtomicBool,
    }

    impl RemoteStore for EditDuringUpsert {
        async fn upsert<T: SyncRecord>(
            &self,
            principal: &Principal,
            rows: &[OutboundRow<'_, T>],
        ) -> RemoteResult<()> {
            if T::TABLE == Table::Sessions && self.armed.swap(false, Ordering::AcqRel) {
                for row in rows {
                    self.local
                        .update::<Session, _>(row.record.id(), |session| {
                            session.title = "Edited mid-push".to_string();
                            session.status = SyncStatus::Dirty;
                        })
                        .await
                        .unwrap();
                }
            }
            self.inner.upsert(principal, rows).await
        }

        async fn select_all<T: SyncRecord>(&self, principal: &Principal) -> RemoteResult<Vec<T>> {
            self.inner.select_all(principal).await
        }
    }

    #[tokio::test]
    async fn edit_during_push_stays_dirty_and_goes_out_next_run() {
        let local = SqliteStore::open_in_memory().unwrap();
        let inner = MemoryRemote::new();
        let orchestrator = SyncOrchestrator::new(
            local.clone(),
            EditDuringUpsert {
                inner: inner.clone(),
                local: local.clone(),
                armed: AtomicBool::new(true),
            },
            StaticIdentity::signed_in(owner()),
        );
        let mut session = Session::new("Original");
        session.id = "f".parse().unwrap();
        local.add(&session).await.unwrap();

        let report = orchestrator.run_sync().await.unwrap();
        let sessions = report.table(Table::Sessions).unwrap();
        assert_eq!(sessions.pushed, 1);
        assert_eq!(sessions.adopted, 0);

        let row = inner.row(Table::Sessions, "user-1", "f").unwrap();
        assert_eq!(row["title"], "Original");
        let pushed_at: DateTime<Utc> = row["updated_at"].as_str().unwrap().parse().unwrap();

        let stored: Session = local.get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Edited mid-push");
        assert_eq!(stored.status, SyncStatus::Dirty);
        assert_eq!(stored.updated_at, Some(pushed_at));

        orchestrator.run_sync().await.unwrap();

        let row = inner.row(Table::Sessions, "user-1", "f").unwrap();
        assert_eq!(row["title"], "Edited mid-push");
        let stored: Session = local.get(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Edited mid-push");
        assert_eq!(stored.status, SyncStatus::Clean);
    }

    struct YieldingIdentity;

    impl IdentityProvider for YieldingIdentity {
        async fn current_user(&self) -> Option<Principal> {
            tokio::task::yield_now().await;
            Some(owner())
        }
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected() {
        let orchestrator = SyncOrchestrator::new(
            SqliteStore::open_in_memory().unwrap(),
            MemoryRemote::new(),
            YieldingIdentity,
        );

        let (first, second) = tokio::join!(orchestrator.run_sync(), orchestrator.run_sync());

        assert_eq!(first.unwrap().outcome, SyncOutcome::Completed);
        assert_eq!(second.unwrap().outcome, SyncOutcome::AlreadyRunning);
        assert!(!orchestrator.is_running());
    }
}
