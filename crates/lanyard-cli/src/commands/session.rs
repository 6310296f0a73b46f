use std::path::{Path, PathBuf};

use chrono::Utc;
use lanyard_core::db::{LocalStore, Tracker};
use lanyard_core::{Session, SyncRecord};

use crate::cli::SessionCommands;
use crate::commands::common::{
    apply_limit, format_date, format_sync_state, open_tracker, parse_date_arg, preview,
    print_json_record, print_json_records, read_audio, require_words, resolve_record,
};
use crate::error::CliError;

pub struct SessionInput {
    pub title: Option<String>,
    pub speaker: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub date: Option<String>,
    pub audio: Option<PathBuf>,
}

impl SessionInput {
    const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.speaker.is_none()
            && self.notes.is_none()
            && self.tags.is_empty()
            && self.date.is_none()
            && self.audio.is_none()
    }
}

pub async fn run_session(command: SessionCommands, db_path: &Path) -> Result<(), CliError> {
    let tracker = open_tracker(db_path)?;

    match command {
        SessionCommands::Add {
            title,
            speaker,
            notes,
            tags,
            date,
        } => {
            let title = require_words(&title, "Session title")?;
            let input = SessionInput {
                title: Some(title),
                speaker,
                notes,
                tags,
                date,
                audio: None,
            };
            let session = add_session(&tracker, input).await?;
            println!("{}", session.id);
        }
        SessionCommands::List(args) => {
            let sessions = apply_limit(tracker.sessions().await?, args.limit);
            if args.json {
                print_json_records(&sessions)?;
            } else if sessions.is_empty() {
                println!("No sessions yet.");
            } else {
                for line in format_session_lines(&sessions) {
                    println!("{line}");
                }
            }
        }
        SessionCommands::Show(args) => {
            let session: Session = resolve_record(&tracker, &args.id).await?;
            if args.json {
                print_json_record(&session)?;
            } else {
                println!("{}", render_session(&session));
            }
        }
        SessionCommands::Edit {
            id,
            title,
            speaker,
            notes,
            tags,
            date,
            audio,
        } => {
            let input = SessionInput {
                title,
                speaker,
                notes,
                tags,
                date,
                audio,
            };
            let session = edit_session(&tracker, &id, input).await?;
            println!("{}", session.id);
        }
        SessionCommands::Delete { id } => {
            let session: Session = resolve_record(&tracker, &id).await?;
            tracker.delete::<Session>(&session.id).await?;
            println!("{}", session.id);
        }
    }

    Ok(())
}

pub async fn add_session<L: LocalStore>(
    tracker: &Tracker<L>,
    input: SessionInput,
) -> Result<Session, CliError> {
    let title = input.title.ok_or(CliError::EmptyField("Session title"))?;
    let mut session = Session::new(title);
    if let Some(speaker) = input.speaker {
        session = session.with_speaker(speaker);
    }
    if let Some(notes) = input.notes {
        session = session.with_notes(notes);
    }
    session.set_tags(input.tags);
    session.date = match input.date.as_deref() {
        Some(date) => parse_date_arg(date)?,
        None => Utc::now().timestamp_millis(),
    };

    Ok(tracker.create(session).await?)
}

pub async fn edit_session<L: LocalStore>(
    tracker: &Tracker<L>,
    query: &str,
    input: SessionInput,
) -> Result<Session, CliError> {
    if input.is_empty() {
        return Err(CliError::NothingToEdit);
    }
    let existing: Session = resolve_record(tracker, query).await?;

    let date = input.date.as_deref().map(parse_date_arg).transpose()?;
    let audio = input.audio.as_deref().map(read_audio).transpose()?;
    if input.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
        return Err(CliError::EmptyField("Session title"));
    }

    Ok(tracker
        .edit(&existing.id, move |session: &mut Session| {
            if let Some(title) = input.title {
                session.title = title.trim().to_string();
            }
            if let Some(speaker) = input.speaker {
                session.speaker = speaker;
            }
            if let Some(notes) = input.notes {
                session.notes = notes;
            }
            if !input.tags.is_empty() {
                session.set_tags(input.tags);
            }
            if let Some(date) = date {
                session.date = date;
            }
            if audio.is_some() {
                session.set_attachment(audio);
            }
        })
        .await?)
}

pub fn format_session_lines(sessions: &[Session]) -> Vec<String> {
    sessions
        .iter()
        .map(|session| {
            let title = preview(&session.title, 40);
            let speaker = preview(&session.speaker, 20);
            let marker = if session.status.is_dirty() { "*" } else { " " };
            format!(
                "{marker} {:<13}  {}  {title:<40}  {speaker}",
                session.id.short(),
                format_date(session.date),
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn render_session(session: &Session) -> String {
    let mut lines = vec![
        format!("id:      {}", session.id),
        format!("title:   {}", session.title),
        format!("date:    {}", format_date(session.date)),
    ];
    if !session.speaker.is_empty() {
        lines.push(format!("speaker: {}", session.speaker));
    }
    if !session.tags.is_empty() {
        let tags = session
            .tags
            .iter()
            .map(|tag| format!("#{tag}"))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("tags:    {tags}"));
    }
    if let Some(audio) = &session.audio {
        lines.push(format!("audio:   {} bytes (this device only)", audio.len()));
    }
    lines.push(format!(
        "sync:    {}",
        format_sync_state(session.status, session.updated_at)
    ));
    if !session.notes.trim().is_empty() {
        lines.push(String::new());
        lines.push(session.notes.clone());
    }
    lines.join("\n")
}
