//! Record identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Stable, client-generated identifier shared by every synchronized record.
///
/// New ids are UUID v7 (time-sortable). Ids arriving from the remote store are
/// accepted verbatim as long as they are not blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

const SHORT_LEN: usize = 13;

impl RecordId {
    /// Create a new unique record ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Millisecond timestamp part of a v7 ID, for log lines and list output
    #[must_use]
    pub fn short(&self) -> &str {
        self.0
            .char_indices()
            .nth(SHORT_LEN)
            .map_or(self.0.as_str(), |(index, _)| &self.0[..index])
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("Record ID cannot be empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_unique() {
        let id1 = RecordId::new();
        let id2 = RecordId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_record_id_parse() {
        let id = RecordId::new();
        let parsed: RecordId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_record_id_rejects_blank() {
        assert!("   ".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_short_id() {
        let id: RecordId = "0192f1c2-aaaa-7bbb".parse().unwrap();
        assert_eq!(id.short(), "0192f1c2-aaaa");

        let tiny: RecordId = "a".parse().unwrap();
        assert_eq!(tiny.short(), "a");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id: RecordId = "abc".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
