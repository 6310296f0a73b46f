//! Table descriptors and the record contract shared by every synced table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::models::{RecordId, SyncStatus};

/// The fixed set of synchronized collections, in sync order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Sessions,
    Booths,
    Connections,
}

impl Table {
    /// Every table, in the order the orchestrator processes them
    pub const ALL: [Self; 3] = [Self::Sessions, Self::Booths, Self::Connections];

    /// Name used for the local `SQLite` table and the remote `PostgREST` resource
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sessions => "sessions",
            Self::Booths => "booths",
            Self::Connections => "connections",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|table| table.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown table: {s}")))
    }
}

/// A record type that lives in one [`Table`] and takes part in sync.
///
/// `Serialize` must produce the wire shape: payload fields plus `updated_at`,
/// without the sync status or the local-only attachment. Both of those are
/// `#[serde(skip)]` on the implementors and travel through the accessors below.
pub trait SyncRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> &RecordId;

    fn updated_at(&self) -> Option<DateTime<Utc>>;

    fn set_updated_at(&mut self, at: DateTime<Utc>);

    fn status(&self) -> SyncStatus;

    fn set_status(&mut self, status: SyncStatus);

    /// Local-only binary payload (recorded audio). Tables without one keep the default.
    fn attachment(&self) -> Option<&[u8]> {
        None
    }

    fn set_attachment(&mut self, _data: Option<Vec<u8>>) {}

    /// Carry the local-only fields of `local` over to this (incoming) copy.
    fn keep_local_only(&mut self, local: &Self) {
        self.set_attachment(local.attachment().map(<[u8]>::to_vec));
    }
}
