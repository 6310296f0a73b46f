//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RecordId, SyncStatus};
use crate::sync::{SyncRecord, Table};
use crate::util::unix_millis_now;

/// A talk or workshop attended at the conference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: RecordId,
    /// Session title
    pub title: String,
    /// Speaker name(s)
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub speaker: String,
    /// Free-form notes
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub notes: String,
    /// Lowercase topic tags
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub tags: Vec<String>,
    /// When the session took place (Unix ms)
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub date: i64,
    /// Set by the last successful push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Local sync status, never sent to the remote store
    #[serde(skip)]
    pub status: SyncStatus,
    /// Recorded audio, kept on this device only
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
}

impl Session {
    /// Create a new, unsynced session dated now
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            title: title.into(),
            speaker: String::new(),
            notes: String::new(),
            tags: Vec::new(),
            date: unix_millis_now(),
            updated_at: None,
            status: SyncStatus::Dirty,
            audio: None,
        }
    }

    #[must_use]
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = speaker.into();
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Replace the tag list.
    ///
    /// Tags are trimmed, stripped of a leading `#`, lowercased and
    /// deduplicated; first occurrence order is kept.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim().trim_start_matches('#').to_lowercase();
            if !tag.is_empty() && !normalized.contains(&tag) {
                normalized.push(tag);
            }
        }
        self.tags = normalized;
    }
}

impl SyncRecord for Session {
    const TABLE: Table = Table::Sessions;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn status(&self) -> SyncStatus {
        self.status
    }

    fn set_status(&mut self, status: SyncStatus) {
        self.status = status;
    }

    fn attachment(&self) -> Option<&[u8]> {
        self.audio.as_deref()
    }

    fn set_attachment(&mut self, data: Option<Vec<u8>>) {
        self.audio = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_new() {
        let session = Session::new("Keynote").with_speaker("Ada");
        assert_eq!(session.title, "Keynote");
        assert_eq!(session.speaker, "Ada");
        assert!(session.status.is_dirty());
        assert!(session.updated_at.is_none());
        assert!(session.date > 0);
    }

    #[test]
    fn test_set_tags_normalizes() {
        let mut session = Session::new("Talk");
        session.set_tags(["#Rust", "rust", " async ", ""]);
        assert_eq!(session.tags, vec!["rust", "async"]);
    }

    #[test]
    fn test_wire_shape_skips_local_fields() {
        let mut session = Session::new("Keynote");
        session.audio = Some(vec![1, 2, 3]);

        let value = serde_json::to_value(&session).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("audio"));
        assert!(!object.contains_key("status"));
        assert!(!object.contains_key("updated_at"));
        assert_eq!(object["title"], "Keynote");
    }

    #[test]
    fn test_deserialize_tolerates_missing_optional_fields() {
        let session: Session = serde_json::from_str(
            r#"{"id":"a","title":"Keynote","updated_at":"2024-05-01T10:00:00.000+00:00"}"#,
        )
        .unwrap();
        assert_eq!(session.id.as_str(), "a");
        assert!(session.speaker.is_empty());
        assert!(session.updated_at.is_some());
        assert!(session.audio.is_none());
    }
}
