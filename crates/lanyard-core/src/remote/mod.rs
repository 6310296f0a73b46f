//! Remote backing store for cloud backup.

mod memory;
mod postgrest;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::Principal;
use crate::sync::SyncRecord;

pub use memory::MemoryRemote;
pub use postgrest::PostgrestRemote;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
    #[error("No access token for user {0}")]
    MissingToken(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Outbound wire row: the record's wire shape plus its owner.
#[derive(Debug, Serialize)]
pub struct OutboundRow<'a, T> {
    #[serde(flatten)]
    pub record: &'a T,
    pub user_id: &'a str,
}

impl<'a, T: SyncRecord> OutboundRow<'a, T> {
    pub fn new(record: &'a T, owner: &'a Principal) -> Self {
        Self {
            record,
            user_id: &owner.id,
        }
    }
}

/// Inbound wire row as returned by a full-table fetch.
#[derive(Debug, Deserialize)]
pub struct InboundRow<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Owner-scoped collection interface over every synced table
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Insert-or-replace by ID as one batch
    async fn upsert<T: SyncRecord>(
        &self,
        principal: &Principal,
        rows: &[OutboundRow<'_, T>],
    ) -> RemoteResult<()>;

    /// Every row of the table the principal may see
    async fn select_all<T: SyncRecord>(&self, principal: &Principal) -> RemoteResult<Vec<T>>;
}
