use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use lanyard_core::db::{LocalStore, SqliteStore, Tracker};
use lanyard_core::{RecordId, SyncRecord, SyncStatus};
use serde::Serialize;

use crate::error::CliError;

/// A record as printed by `--json`: wire fields plus local sync state
#[derive(Debug, Serialize)]
pub struct RecordView<'a, T> {
    #[serde(flatten)]
    pub record: &'a T,
    pub sync_status: SyncStatus,
    pub has_audio: bool,
}

impl<'a, T: SyncRecord> RecordView<'a, T> {
    pub fn new(record: &'a T) -> Self {
        Self {
            record,
            sync_status: record.status(),
            has_audio: record.attachment().is_some(),
        }
    }
}

pub fn print_json_records<T: SyncRecord>(records: &[T]) -> Result<(), CliError> {
    let views = records.iter().map(RecordView::new).collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

pub fn print_json_record<T: SyncRecord>(record: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(&RecordView::new(record))?);
    Ok(())
}

pub fn apply_limit<T>(mut records: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("LANYARD_DB_PATH").map(PathBuf::from))
    {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("lanyard").join("lanyard.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn open_store(path: &Path) -> Result<SqliteStore, CliError> {
    Ok(SqliteStore::open(path)?)
}

pub fn open_tracker(path: &Path) -> Result<Tracker<SqliteStore>, CliError> {
    Ok(Tracker::new(open_store(path)?))
}

/// Join positional words into one value, `None` when blank
pub fn join_words(parts: &[String]) -> Option<String> {
    normalize_content(&parts.join(" "))
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn require_words(parts: &[String], field: &'static str) -> Result<String, CliError> {
    join_words(parts).ok_or(CliError::EmptyField(field))
}

pub fn normalize_record_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyRecordId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Find a record by exact ID, falling back to a unique ID prefix
pub async fn resolve_record<T, L>(tracker: &Tracker<L>, query: &str) -> Result<T, CliError>
where
    T: SyncRecord,
    L: LocalStore,
{
    let query = normalize_record_identifier(query)?;

    if let Ok(id) = query.parse::<RecordId>() {
        if let Some(record) = tracker.get::<T>(&id).await? {
            return Ok(record);
        }
    }

    let mut matches = tracker.find_by_prefix::<T>(&query).await?;
    match matches.len() {
        0 => Err(CliError::RecordNotFound {
            table: T::TABLE,
            query,
        }),
        1 => Ok(matches.remove(0)),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|record| record.id().as_str().chars().take(18).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousRecordId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM` (local time) or RFC 3339 into Unix ms
pub fn parse_date_arg(value: &str) -> Result<i64, CliError> {
    let value = value.trim();
    let invalid = || CliError::InvalidDate(value.to_string());

    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Ok(date_time.timestamp_millis());
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(invalid)?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|date_time| date_time.timestamp_millis())
        .ok_or_else(invalid)
}

pub fn format_date(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| {
            date_time
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

pub fn format_sync_state(status: SyncStatus, updated_at: Option<DateTime<Utc>>) -> String {
    match (status, updated_at) {
        (SyncStatus::Dirty, _) => "pending".to_string(),
        (SyncStatus::Clean, Some(at)) => format!(
            "synced {}",
            format_relative_time(at.timestamp_millis(), Utc::now().timestamp_millis())
        ),
        (SyncStatus::Clean, None) => "synced".to_string(),
    }
}

/// First line, whitespace collapsed, cut to `max_chars`
pub fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < 0 {
        "upcoming".to_string()
    } else if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn read_audio(path: &Path) -> Result<Vec<u8>, CliError> {
    Ok(std::fs::read(path)?)
}
