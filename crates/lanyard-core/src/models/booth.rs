//! Booth visit model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RecordId, SyncStatus};
use crate::sync::{SyncRecord, Table};

/// Answer style expected for a booth question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "yes/no")]
    YesNo,
    #[default]
    #[serde(rename = "short")]
    Short,
}

/// A question asked (or to ask) at a booth, with the answer received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoothQuestion {
    pub id: String,
    pub question: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub answer: String,
    #[serde(rename = "type", default, deserialize_with = "super::null_as_default")]
    pub kind: QuestionKind,
}

impl BoothQuestion {
    #[must_use]
    pub fn new(kind: QuestionKind, question: impl Into<String>) -> Self {
        Self {
            id: RecordId::new().to_string(),
            question: question.into(),
            answer: String::new(),
            kind,
        }
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

/// A company booth visited at the conference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booth {
    /// Unique identifier
    pub id: RecordId,
    /// Company name
    pub company: String,
    /// Representative spoken to
    #[serde(rename = "repName", default, deserialize_with = "super::null_as_default")]
    pub rep_name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub notes: String,
    /// Whether an application was submitted
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub applied: bool,
    /// Application deadline (Unix ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<i64>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub questions: Vec<BoothQuestion>,
    /// Set by the last successful push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Local sync status, never sent to the remote store
    #[serde(skip)]
    pub status: SyncStatus,
}

impl Booth {
    /// Create a new, unsynced booth visit
    #[must_use]
    pub fn new(company: impl Into<String>) -> Self {
        Self {
            id: RecordId::new(),
            company: company.into(),
            rep_name: String::new(),
            notes: String::new(),
            applied: false,
            deadline: None,
            questions: Vec::new(),
            updated_at: None,
            status: SyncStatus::Dirty,
        }
    }

    #[must_use]
    pub fn with_rep_name(mut self, rep_name: impl Into<String>) -> Self {
        self.rep_name = rep_name.into();
        self
    }

    /// Newest questions go first
    pub fn add_question(&mut self, question: BoothQuestion) {
        self.questions.insert(0, question);
    }

    /// Record an answer for the question whose id starts with `id_prefix`.
    ///
    /// Returns `false` when no question, or more than one, matches.
    pub fn answer_question(&mut self, id_prefix: &str, answer: impl Into<String>) -> bool {
        let mut matches = self
            .questions
            .iter_mut()
            .filter(|question| question.id.starts_with(id_prefix));
        match (matches.next(), matches.next()) {
            (Some(question), None) => {
                question.answer = answer.into();
                true
            }
            _ => false,
        }
    }

    pub fn remove_question(&mut self, id: &str) -> bool {
        let before = self.questions.len();
        self.questions.retain(|question| question.id != id);
        self.questions.len() != before
    }

    /// Deadline has passed and nothing was submitted
    #[must_use]
    pub fn deadline_missed(&self, now_ms: i64) -> bool {
        !self.applied && self.deadline.is_some_and(|deadline| deadline < now_ms)
    }
}

impl SyncRecord for Booth {
    const TABLE: Table = Table::Booths;

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
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_question_wire_names() {
        let question = BoothQuestion {
            id: "q1".to_string(),
            question: "Remote options?".to_string(),
            answer: "Yes".to_string(),
            kind: QuestionKind::YesNo,
        };
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["type"], "yes/no");
    }

    #[test]
    fn test_booth_wire_uses_rep_name_key() {
        let booth = Booth::new("Vercel").with_rep_name("Sam");
        let value = serde_json::to_value(&booth).unwrap();
        assert_eq!(value["repName"], "Sam");
        assert!(value.get("status").is_none());
    }

    #[test]
    fn test_add_question_prepends() {
        let mut booth = Booth::new("Acme");
        booth.add_question(BoothQuestion::new(QuestionKind::Short, "first"));
        booth.add_question(BoothQuestion::new(QuestionKind::Short, "second"));
        assert_eq!(booth.questions[0].question, "second");
    }

    #[test]
    fn test_answer_question_by_prefix() {
        let mut booth = Booth::new("Acme");
        booth.questions = vec![
            BoothQuestion {
                id: "abc-1".to_string(),
                question: "Stack?".to_string(),
                answer: String::new(),
                kind: QuestionKind::Short,
            },
            BoothQuestion {
                id: "abd-2".to_string(),
                question: "Remote?".to_string(),
                answer: String::new(),
                kind: QuestionKind::YesNo,
            },
        ];

        assert!(!booth.answer_question("ab", "ambiguous"));
        assert!(booth.answer_question("abc", "Rust"));
        assert_eq!(booth.questions[0].answer, "Rust");
        assert!(booth.questions[0].is_answered());
        assert!(!booth.questions[1].is_answered());
    }

    #[test]
    fn test_deadline_missed() {
        let mut booth = Booth::new("Acme");
        assert!(!booth.deadline_missed(1_000));

        booth.deadline = Some(500);
        assert!(booth.deadline_missed(1_000));

        booth.applied = true;
        assert!(!booth.deadline_missed(1_000));
    }
}
