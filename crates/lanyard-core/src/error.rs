//! Error types for lanyard-core

use thiserror::Error;

use crate::sync::Table;

/// Result type alias using lanyard-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the local store and the services layered on it.
///
/// Remote and auth failures have their own types (`RemoteError`, `AuthError`)
/// because the sync orchestrator contains them per table instead of propagating.
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Record not found: {table}/{id}")]
    NotFound { table: Table, id: String },

    /// Record id already taken in the table
    #[error("Record already exists: {table}/{id}")]
    AlreadyExists { table: Table, id: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
