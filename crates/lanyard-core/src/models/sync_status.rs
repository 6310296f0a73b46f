//! Local sync status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a local record still has changes the remote store has not seen.
///
/// Stored as the `dirty` integer column: 1 for `Dirty`, 0 for `Clean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Local changes not yet pushed
    #[default]
    Dirty,
    /// Matches the last known remote state
    Clean,
}

impl SyncStatus {
    /// Integer form used by the local store
    #[must_use]
    pub const fn as_flag(self) -> i64 {
        match self {
            Self::Dirty => 1,
            Self::Clean => 0,
        }
    }

    /// Decode the stored integer; anything non-zero is dirty
    #[must_use]
    pub const fn from_flag(flag: i64) -> Self {
        if flag == 0 {
            Self::Clean
        } else {
            Self::Dirty
        }
    }

    #[must_use]
    pub const fn is_dirty(self) -> bool {
        matches!(self, Self::Dirty)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dirty => f.write_str("dirty"),
            Self::Clean => f.write_str("clean"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_encoding() {
        assert_eq!(SyncStatus::Dirty.as_flag(), 1);
        assert_eq!(SyncStatus::Clean.as_flag(), 0);
        assert_eq!(SyncStatus::from_flag(0), SyncStatus::Clean);
        assert_eq!(SyncStatus::from_flag(1), SyncStatus::Dirty);
        assert_eq!(SyncStatus::from_flag(7), SyncStatus::Dirty);
    }

    #[test]
    fn test_new_records_default_to_dirty() {
        assert!(SyncStatus::default().is_dirty());
    }
}
