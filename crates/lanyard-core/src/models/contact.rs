//! Contact (networking connection) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RecordId, SyncStatus};
use crate::sync::{SyncRecord, Table};

/// Someone met at the conference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier
    pub id: RecordId,
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub role: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub notes: String,
    /// Set by the last successful push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Local sync status, never sent to the remote store
    #[serde(skip)]
    pub status: SyncStatus,
    /// Short voice note, kept on this device only
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
}

impl Contact {
    /// Create a new, unsynced contact
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            name: name.into(),
            role: String::new(),
            company: String::new(),
            phone: None,
            email: None,
            website: None,
            linkedin: None,
            notes: String::new(),
            updated_at: None,
            status: SyncStatus::Dirty,
            audio: None,
        }
    }

    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// "Role at Company", omitting whichever part is blank
    #[must_use]
    pub fn headline(&self) -> String {
        match (self.role.trim(), self.company.trim()) {
            ("", "") => String::new(),
            (role, "") => role.to_string(),
            ("", company) => company.to_string(),
            (role, company) => format!("{role} at {company}"),
        }
    }
}

impl SyncRecord for Contact {
    const TABLE: Table = Table::Connections;

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
    fn test_headline() {
        let contact = Contact::new("Grace");
        assert_eq!(contact.headline(), "");

        let contact = contact.with_role("CTO");
        assert_eq!(contact.headline(), "CTO");

        let contact = contact.with_company("Initech");
        assert_eq!(contact.headline(), "CTO at Initech");
    }

    #[test]
    fn test_wire_shape_omits_audio_and_empty_channels() {
        let mut contact = Contact::new("Grace").with_company("Initech");
        contact.audio = Some(vec![0xFF; 16]);
        contact.email = Some("grace@example.com".to_string());

        let value = serde_json::to_value(&contact).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("audio"));
        assert!(!object.contains_key("phone"));
        assert_eq!(object["email"], "grace@example.com");
    }
}
