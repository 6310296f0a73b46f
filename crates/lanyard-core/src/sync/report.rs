//! Per-invocation sync results

use serde::Serialize;

use super::Table;

/// How a `run_sync` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every table was attempted (some may still report errors)
    Completed,
    /// No signed-in user; nothing was touched
    NotAuthenticated,
    /// Another sync was in flight; nothing was touched
    AlreadyRunning,
}

/// What happened to one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: Table,
    /// Dirty records confirmed by the remote store
    pub pushed: usize,
    pub push_error: Option<String>,
    /// Rows returned by the remote fetch
    pub fetched: usize,
    /// Remote rows written into the local store
    pub adopted: usize,
    /// Remote rows ignored because the local copy was as new or newer
    pub skipped: usize,
    pub pull_error: Option<String>,
}

impl TableReport {
    #[must_use]
    pub const fn new(table: Table) -> Self {
        Self {
            table,
            pushed: 0,
            push_error: None,
            fetched: 0,
            adopted: 0,
            skipped: 0,
            pull_error: None,
        }
    }

    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.push_error.is_some() || self.pull_error.is_some()
    }
}

/// Result of one orchestrator pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub tables: Vec<TableReport>,
}

impl SyncReport {
    #[must_use]
    pub const fn skipped(outcome: SyncOutcome) -> Self {
        Self {
            outcome,
            tables: Vec::new(),
        }
    }

    #[must_use]
    pub const fn completed(tables: Vec<TableReport>) -> Self {
        Self {
            outcome: SyncOutcome::Completed,
            tables,
        }
    }

    /// Completed with no remote failure in any table
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcome == SyncOutcome::Completed && !self.tables.iter().any(TableReport::has_errors)
    }

    #[must_use]
    pub fn table(&self, table: Table) -> Option<&TableReport> {
        self.tables.iter().find(|report| report.table == table)
    }

    #[must_use]
    pub fn total_pushed(&self) -> usize {
        self.tables.iter().map(|report| report.pushed).sum()
    }

    #[must_use]
    pub fn total_adopted(&self) -> usize {
        self.tables.iter().map(|report| report.adopted).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_report_is_not_clean() {
        let report = SyncReport::skipped(SyncOutcome::NotAuthenticated);
        assert!(!report.is_clean());
        assert!(report.tables.is_empty());
    }

    #[test]
    fn totals_and_errors() {
        let mut sessions = TableReport::new(Table::Sessions);
        sessions.pushed = 2;
        sessions.adopted = 1;
        let mut booths = TableReport::new(Table::Booths);
        booths.pull_error = Some("HTTP 500".to_string());

        let report = SyncReport::completed(vec![sessions, booths]);
        assert_eq!(report.total_pushed(), 2);
        assert_eq!(report.total_adopted(), 1);
        assert!(!report.is_clean());
        assert!(report.table(Table::Booths).unwrap().has_errors());
        assert!(report.table(Table::Connections).is_none());
    }
}
