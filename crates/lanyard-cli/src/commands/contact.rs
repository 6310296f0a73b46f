use std::path::{Path, PathBuf};

use lanyard_core::db::{LocalStore, Tracker};
use lanyard_core::util::normalize_text_option;
use lanyard_core::{Contact, SyncRecord};

use crate::cli::{ContactCommands, ContactFields};
use crate::commands::common::{
    apply_limit, format_sync_state, open_tracker, preview, print_json_record, print_json_records,
    read_audio, require_words, resolve_record,
};
use crate::error::CliError;

impl ContactFields {
    const fn is_empty(&self) -> bool {
        self.role.is_none()
            && self.company.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.website.is_none()
            && self.linkedin.is_none()
            && self.notes.is_none()
    }

    fn apply(self, contact: &mut Contact) {
        if let Some(role) = self.role {
            contact.role = role.trim().to_string();
        }
        if let Some(company) = self.company {
            contact.company = company.trim().to_string();
        }
        // An empty value clears the optional channels
        if self.phone.is_some() {
            contact.phone = normalize_text_option(self.phone);
        }
        if self.email.is_some() {
            contact.email = normalize_text_option(self.email);
        }
        if self.website.is_some() {
            contact.website = normalize_text_option(self.website);
        }
        if self.linkedin.is_some() {
            contact.linkedin = normalize_text_option(self.linkedin);
        }
        if let Some(notes) = self.notes {
            contact.notes = notes;
        }
    }
}

pub async fn run_contact(command: ContactCommands, db_path: &Path) -> Result<(), CliError> {
    let tracker = open_tracker(db_path)?;

    match command {
        ContactCommands::Add { name, fields } => {
            let name = require_words(&name, "Contact name")?;
            let contact = add_contact(&tracker, name, fields).await?;
            println!("{}", contact.id);
        }
        ContactCommands::List(args) => {
            let contacts = apply_limit(tracker.contacts().await?, args.limit);
            if args.json {
                print_json_records(&contacts)?;
            } else if contacts.is_empty() {
                println!("No contacts yet.");
            } else {
                for line in format_contact_lines(&contacts) {
                    println!("{line}");
                }
            }
        }
        ContactCommands::Show(args) => {
            let contact: Contact = resolve_record(&tracker, &args.id).await?;
            if args.json {
                print_json_record(&contact)?;
            } else {
                println!("{}", render_contact(&contact));
            }
        }
        ContactCommands::Edit {
            id,
            name,
            fields,
            audio,
        } => {
            let contact = edit_contact(&tracker, &id, name, fields, audio).await?;
            println!("{}", contact.id);
        }
        ContactCommands::Delete { id } => {
            let contact: Contact = resolve_record(&tracker, &id).await?;
            tracker.delete::<Contact>(&contact.id).await?;
            println!("{}", contact.id);
        }
    }

    Ok(())
}

pub async fn add_contact<L: LocalStore>(
    tracker: &Tracker<L>,
    name: String,
    fields: ContactFields,
) -> Result<Contact, CliError> {
    let mut contact = Contact::new(name);
    fields.apply(&mut contact);
    Ok(tracker.create(contact).await?)
}

pub async fn edit_contact<L: LocalStore>(
    tracker: &Tracker<L>,
    query: &str,
    name: Option<String>,
    fields: ContactFields,
    audio: Option<PathBuf>,
) -> Result<Contact, CliError> {
    if name.is_none() && audio.is_none() && fields.is_empty() {
        return Err(CliError::NothingToEdit);
    }
    if name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(CliError::EmptyField("Contact name"));
    }
    let existing: Contact = resolve_record(tracker, query).await?;
    let audio = audio.as_deref().map(read_audio).transpose()?;

    Ok(tracker
        .edit(&existing.id, move |contact: &mut Contact| {
            if let Some(name) = name {
                contact.name = name.trim().to_string();
            }
            fields.apply(contact);
            if audio.is_some() {
                contact.set_attachment(audio);
            }
        })
        .await?)
}

pub fn format_contact_lines(contacts: &[Contact]) -> Vec<String> {
    contacts
        .iter()
        .map(|contact| {
            let name = preview(&contact.name, 24);
            let headline = preview(&contact.headline(), 40);
            let marker = if contact.status.is_dirty() { "*" } else { " " };
            format!("{marker} {:<13}  {name:<24}  {headline}", contact.id.short())
                .trim_end()
                .to_string()
        })
        .collect()
}

pub fn render_contact(contact: &Contact) -> String {
    let mut lines = vec![
        format!("id:       {}", contact.id),
        format!("name:     {}", contact.name),
    ];
    let headline = contact.headline();
    if !headline.is_empty() {
        lines.push(format!("works:    {headline}"));
    }
    for (label, value) in [
        ("phone:", &contact.phone),
        ("email:", &contact.email),
        ("website:", &contact.website),
        ("linkedin:", &contact.linkedin),
    ] {
        if let Some(value) = value {
            lines.push(format!("{label:<9} {value}"));
        }
    }
    if let Some(audio) = &contact.audio {
        lines.push(format!("audio:    {} bytes (this device only)", audio.len()));
    }
    lines.push(format!(
        "sync:     {}",
        format_sync_state(contact.status, contact.updated_at)
    ));
    if !contact.notes.trim().is_empty() {
        lines.push(String::new());
        lines.push(contact.notes.clone());
    }
    lines.join("\n")
}
