use std::path::Path;

use lanyard_core::remote::PostgrestRemote;
use lanyard_core::{SyncOrchestrator, SyncOutcome, SyncReport, Table, TableReport};
use serde::Serialize;

use crate::auth::identity_for_profile;
use crate::cli::SyncCommands;
use crate::commands::common::{open_store, open_tracker};
use crate::config_profiles::{remote_config_for, CliProfilesConfig};
use crate::error::CliError;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PendingCount {
    pub table: Table,
    pub pending: usize,
}

pub async fn run_sync(
    command: Option<SyncCommands>,
    global_profile: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    match command {
        Some(SyncCommands::Status { json }) => run_sync_status(json, db_path).await,
        None => run_sync_now(global_profile, db_path).await,
    }
}

async fn run_sync_now(global_profile: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let remote_config =
        remote_config_for(config.profile(&profile_name))?.ok_or(CliError::SyncNotConfigured)?;

    let orchestrator = SyncOrchestrator::new(
        open_store(db_path)?,
        PostgrestRemote::new(&remote_config)?,
        identity_for_profile(&profile_name, &remote_config)?,
    );
    tracing::debug!("Syncing profile '{}'", profile_name);

    let report = orchestrator.run_sync().await?;
    for line in format_sync_report(&report) {
        println!("{line}");
    }
    Ok(())
}

async fn run_sync_status(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let pending = pending_counts(db_path).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&pending)?);
        return Ok(());
    }

    let total: usize = pending.iter().map(|count| count.pending).sum();
    for count in &pending {
        println!("{:<12} {} pending", count.table, count.pending);
    }
    if total == 0 {
        println!("Everything is synced.");
    }
    Ok(())
}

pub async fn pending_counts(db_path: &Path) -> Result<Vec<PendingCount>, CliError> {
    let tracker = open_tracker(db_path)?;
    Ok(tracker
        .pending_counts()
        .await?
        .into_iter()
        .map(|(table, pending)| PendingCount { table, pending })
        .collect())
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    match report.outcome {
        SyncOutcome::NotAuthenticated => {
            vec!["Not signed in; nothing synced. Run `lanyard auth login` first.".to_string()]
        }
        SyncOutcome::AlreadyRunning => vec!["A sync is already running.".to_string()],
        SyncOutcome::Completed => {
            let mut lines = report
                .tables
                .iter()
                .flat_map(format_table_report)
                .collect::<Vec<_>>();
            if report.is_clean() {
                lines.push("Sync completed".to_string());
            } else {
                lines.push(
                    "Sync completed with errors; unsent changes stay pending for the next sync"
                        .to_string(),
                );
            }
            lines
        }
    }
}

fn format_table_report(table: &TableReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<12} pushed {}  pulled {}  updated {}  unchanged {}",
        table.table, table.pushed, table.fetched, table.adopted, table.skipped
    )];
    if let Some(error) = &table.push_error {
        lines.push(format!("  push failed: {error}"));
    }
    if let Some(error) = &table.pull_error {
        lines.push(format!("  pull failed: {error}"));
    }
    lines
}
