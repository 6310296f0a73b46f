use std::io;

use lanyard_core::auth::AuthError;
use lanyard_core::config::ConfigError;
use lanyard_core::remote::RemoteError;
use lanyard_core::Table;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] lanyard_core::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Remote configuration error: {0}")]
    RemoteConfig(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error("Record ID cannot be empty")]
    EmptyRecordId,
    #[error("No {table} record found for id/prefix: {query}")]
    RecordNotFound { table: Table, query: String },
    #[error("{0}")]
    AmbiguousRecordId(String),
    #[error("Booth has no question #{0}")]
    QuestionNotFound(usize),
    #[error("Invalid date '{0}': expected YYYY-MM-DD, 'YYYY-MM-DD HH:MM' or RFC 3339")]
    InvalidDate(String),
    #[error("Nothing to change; pass at least one field option")]
    NothingToEdit,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Run `lanyard config init` + `lanyard auth login`, or set SUPABASE_URL and SUPABASE_ANON_KEY."
    )]
    SyncNotConfigured,
}
