//! Data models for Lanyard

mod booth;
mod contact;
mod record_id;
mod session;
mod sync_status;

pub use booth::{Booth, BoothQuestion, QuestionKind};
pub use contact::Contact;
pub use record_id::RecordId;
pub use session::Session;
pub use sync_status::SyncStatus;

use serde::{Deserialize, Deserializer};

/// Read an explicit `null` the same way as a missing key.
///
/// Rows written by other clients may leave optional columns NULL.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn null_columns_read_as_defaults() {
        let booth: Booth = serde_json::from_str(
            r#"{
                "id": "b1",
                "company": "Acme",
                "repName": null,
                "notes": null,
                "applied": null,
                "questions": null,
                "updated_at": "2024-05-01T10:00:00+00:00"
            }"#,
        )
        .unwrap();
        assert_eq!(booth.rep_name, "");
        assert_eq!(booth.notes, "");
        assert!(!booth.applied);
        assert!(booth.questions.is_empty());

        let contact: Contact = serde_json::from_str(
            r#"{"id": "c1", "name": "Grace", "role": null, "company": null, "notes": null}"#,
        )
        .unwrap();
        assert_eq!(contact.role, "");
        assert_eq!(contact.company, "");
        assert_eq!(contact.notes, "");

        let session: Session = serde_json::from_str(
            r#"{"id": "s1", "title": "Keynote", "speaker": null, "notes": null, "tags": null, "date": null}"#,
        )
        .unwrap();
        assert_eq!(session.speaker, "");
        assert!(session.tags.is_empty());
        assert_eq!(session.date, 0);
    }

    #[test]
    fn null_question_fields_read_as_defaults() {
        let question: BoothQuestion = serde_json::from_str(
            r#"{"id": "q1", "question": "Remote friendly?", "answer": null, "type": null}"#,
        )
        .unwrap();
        assert_eq!(question.answer, "");
        assert_eq!(question.kind, QuestionKind::default());
    }
}
