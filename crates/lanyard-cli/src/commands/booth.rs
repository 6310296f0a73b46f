use std::path::Path;

use chrono::Utc;
use lanyard_core::db::{LocalStore, Tracker};
use lanyard_core::questions::{self, Theme};
use lanyard_core::{Booth, BoothQuestion, QuestionKind};

use crate::cli::BoothCommands;
use crate::commands::common::{
    apply_limit, format_date, format_sync_state, normalize_content, open_tracker, parse_date_arg,
    preview, print_json_record, print_json_records, require_words, resolve_record,
};
use crate::error::CliError;

#[derive(Default)]
pub struct BoothInput {
    pub company: Option<String>,
    pub rep_name: Option<String>,
    pub notes: Option<String>,
    pub applied: Option<bool>,
    pub deadline: Option<String>,
    pub clear_deadline: bool,
}

impl BoothInput {
    const fn is_empty(&self) -> bool {
        self.company.is_none()
            && self.rep_name.is_none()
            && self.notes.is_none()
            && self.applied.is_none()
            && self.deadline.is_none()
            && !self.clear_deadline
    }
}

pub struct AskInput {
    pub question: Option<String>,
    pub count: usize,
    pub theme: Option<Theme>,
    pub kind: QuestionKind,
}

pub async fn run_booth(command: BoothCommands, db_path: &Path) -> Result<(), CliError> {
    let tracker = open_tracker(db_path)?;

    match command {
        BoothCommands::Add {
            company,
            rep,
            notes,
            applied,
            deadline,
        } => {
            let input = BoothInput {
                company: Some(require_words(&company, "Company name")?),
                rep_name: rep,
                notes,
                applied: Some(applied),
                deadline,
                clear_deadline: false,
            };
            let booth = add_booth(&tracker, input).await?;
            println!("{}", booth.id);
        }
        BoothCommands::List(args) => {
            let booths = apply_limit(tracker.booths().await?, args.limit);
            if args.json {
                print_json_records(&booths)?;
            } else if booths.is_empty() {
                println!("No booths yet.");
            } else {
                for line in format_booth_lines(&booths, Utc::now().timestamp_millis()) {
                    println!("{line}");
                }
            }
        }
        BoothCommands::Show(args) => {
            let booth: Booth = resolve_record(&tracker, &args.id).await?;
            if args.json {
                print_json_record(&booth)?;
            } else {
                println!("{}", render_booth(&booth, Utc::now().timestamp_millis()));
            }
        }
        BoothCommands::Edit {
            id,
            company,
            rep,
            notes,
            applied,
            deadline,
            clear_deadline,
        } => {
            let input = BoothInput {
                company,
                rep_name: rep,
                notes,
                applied,
                deadline,
                clear_deadline,
            };
            let booth = edit_booth(&tracker, &id, input).await?;
            println!("{}", booth.id);
        }
        BoothCommands::Delete { id } => {
            let booth: Booth = resolve_record(&tracker, &id).await?;
            tracker.delete::<Booth>(&booth.id).await?;
            println!("{}", booth.id);
        }
        BoothCommands::Ask {
            id,
            question,
            count,
            theme,
            yes_no,
        } => {
            let input = AskInput {
                question,
                count,
                theme,
                kind: if yes_no {
                    QuestionKind::YesNo
                } else {
                    QuestionKind::Short
                },
            };
            let booth = ask_questions(&tracker, &id, input).await?;
            println!("{}", render_questions(&booth));
        }
        BoothCommands::Answer { id, number, answer } => {
            let answer = require_words(&answer, "Answer")?;
            let booth = answer_question(&tracker, &id, number, answer).await?;
            println!("{}", render_questions(&booth));
        }
        BoothCommands::Forget { id, number } => {
            let booth = forget_question(&tracker, &id, number).await?;
            println!("{}", render_questions(&booth));
        }
    }

    Ok(())
}

pub async fn add_booth<L: LocalStore>(
    tracker: &Tracker<L>,
    input: BoothInput,
) -> Result<Booth, CliError> {
    let company = input.company.ok_or(CliError::EmptyField("Company name"))?;
    let mut booth = Booth::new(company);
    if let Some(rep_name) = input.rep_name {
        booth = booth.with_rep_name(rep_name);
    }
    if let Some(notes) = input.notes {
        booth.notes = notes;
    }
    booth.applied = input.applied.unwrap_or(false);
    booth.deadline = input.deadline.as_deref().map(parse_date_arg).transpose()?;

    Ok(tracker.create(booth).await?)
}

pub async fn edit_booth<L: LocalStore>(
    tracker: &Tracker<L>,
    query: &str,
    input: BoothInput,
) -> Result<Booth, CliError> {
    if input.is_empty() {
        return Err(CliError::NothingToEdit);
    }
    if input
        .company
        .as_deref()
        .is_some_and(|company| company.trim().is_empty())
    {
        return Err(CliError::EmptyField("Company name"));
    }
    let existing: Booth = resolve_record(tracker, query).await?;
    let deadline = input.deadline.as_deref().map(parse_date_arg).transpose()?;

    Ok(tracker
        .edit(&existing.id, move |booth: &mut Booth| {
            if let Some(company) = input.company {
                booth.company = company.trim().to_string();
            }
            if let Some(rep_name) = input.rep_name {
                booth.rep_name = rep_name;
            }
            if let Some(notes) = input.notes {
                booth.notes = notes;
            }
            if let Some(applied) = input.applied {
                booth.applied = applied;
            }
            if input.clear_deadline {
                booth.deadline = None;
            } else if deadline.is_some() {
                booth.deadline = deadline;
            }
        })
        .await?)
}

pub async fn ask_questions<L: LocalStore>(
    tracker: &Tracker<L>,
    query: &str,
    input: AskInput,
) -> Result<Booth, CliError> {
    let existing: Booth = resolve_record(tracker, query).await?;

    let texts = match input.question.as_deref().and_then(normalize_content) {
        Some(text) => vec![text],
        None => questions::random_questions(input.count, input.theme)
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    Ok(tracker
        .edit(&existing.id, move |booth: &mut Booth| {
            for text in texts {
                booth.add_question(BoothQuestion::new(input.kind, text));
            }
        })
        .await?)
}

/// `number` is 1-based, in the order `booth show` lists questions
pub async fn answer_question<L: LocalStore>(
    tracker: &Tracker<L>,
    query: &str,
    number: usize,
    answer: String,
) -> Result<Booth, CliError> {
    let existing: Booth = resolve_record(tracker, query).await?;
    let question_id = question_id_at(&existing, number)?;

    Ok(tracker
        .edit(&existing.id, move |booth: &mut Booth| {
            booth.answer_question(&question_id, answer);
        })
        .await?)
}

pub async fn forget_question<L: LocalStore>(
    tracker: &Tracker<L>,
    query: &str,
    number: usize,
) -> Result<Booth, CliError> {
    let existing: Booth = resolve_record(tracker, query).await?;
    let question_id = question_id_at(&existing, number)?;

    Ok(tracker
        .edit(&existing.id, move |booth: &mut Booth| {
            booth.remove_question(&question_id);
        })
        .await?)
}

fn question_id_at(booth: &Booth, number: usize) -> Result<String, CliError> {
    number
        .checked_sub(1)
        .and_then(|index| booth.questions.get(index))
        .map(|question| question.id.clone())
        .ok_or(CliError::QuestionNotFound(number))
}

pub fn format_booth_lines(booths: &[Booth], now_ms: i64) -> Vec<String> {
    booths
        .iter()
        .map(|booth| {
            let company = preview(&booth.company, 30);
            let marker = if booth.status.is_dirty() { "*" } else { " " };
            let state = application_state(booth, now_ms);
            let answered = booth
                .questions
                .iter()
                .filter(|question| question.is_answered())
                .count();
            format!(
                "{marker} {:<13}  {company:<30}  {state:<22}  {answered}/{} answered",
                booth.id.short(),
                booth.questions.len(),
            )
        })
        .collect()
}

fn application_state(booth: &Booth, now_ms: i64) -> String {
    if booth.applied {
        "applied".to_string()
    } else if booth.deadline_missed(now_ms) {
        "deadline missed".to_string()
    } else if let Some(deadline) = booth.deadline {
        format!("due {}", format_date(deadline))
    } else {
        "not applied".to_string()
    }
}

pub fn render_questions(booth: &Booth) -> String {
    if booth.questions.is_empty() {
        return "No questions yet. Try `lanyard booth ask`.".to_string();
    }
    booth
        .questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let kind = match question.kind {
                QuestionKind::YesNo => " (yes/no)",
                QuestionKind::Short => "",
            };
            let line = format!("{:>2}. {}{kind}", index + 1, question.question);
            if question.is_answered() {
                format!("{line}\n    -> {}", question.answer.trim())
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_booth(booth: &Booth, now_ms: i64) -> String {
    let mut lines = vec![
        format!("id:       {}", booth.id),
        format!("company:  {}", booth.company),
    ];
    if !booth.rep_name.is_empty() {
        lines.push(format!("rep:      {}", booth.rep_name));
    }
    lines.push(format!("status:   {}", application_state(booth, now_ms)));
    lines.push(format!(
        "sync:     {}",
        format_sync_state(booth.status, booth.updated_at)
    ));
    if !booth.notes.trim().is_empty() {
        lines.push(String::new());
        lines.push(booth.notes.clone());
    }
    lines.push(String::new());
    lines.push(render_questions(booth));
    lines.join("\n")
}
