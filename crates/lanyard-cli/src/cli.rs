use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use lanyard_core::questions::Theme;

#[derive(Parser)]
#[command(name = "lanyard")]
#[command(about = "Track conference sessions, booths and contacts, backed up to the cloud")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for auth/sync configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Talks and workshops attended
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Company booths visited
    Booth {
        #[command(subcommand)]
        command: BoothCommands,
    },
    /// People met
    #[command(alias = "connection")]
    Contact {
        #[command(subcommand)]
        command: ContactCommands,
    },
    /// Push local changes and pull newer records from the cloud
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Authenticate CLI profile with Supabase
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ListArgs {
    /// Number of records to show
    #[arg(short, long)]
    pub limit: Option<usize>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Record ID or unique ID prefix
    pub id: String,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Record a new session
    #[command(alias = "new")]
    Add {
        /// Session title
        title: Vec<String>,
        #[arg(long)]
        speaker: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Tag (repeatable)
        #[arg(long = "tag", value_name = "TAG", action = ArgAction::Append)]
        tags: Vec<String>,
        /// When the session takes place (defaults to now)
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
    },
    /// List sessions, most recent first
    List(ListArgs),
    /// Show one session
    Show(ShowArgs),
    /// Change fields of a session
    Edit {
        /// Session ID or unique ID prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        speaker: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Replace the tags (repeatable)
        #[arg(long = "tag", value_name = "TAG", action = ArgAction::Append)]
        tags: Vec<String>,
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
        /// Attach a recording kept on this device only
        #[arg(long, value_name = "PATH")]
        audio: Option<PathBuf>,
    },
    /// Delete a session from this device
    Delete {
        /// Session ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum BoothCommands {
    /// Record a booth visit
    #[command(alias = "new")]
    Add {
        /// Company name
        company: Vec<String>,
        /// Representative spoken to
        #[arg(long, value_name = "NAME")]
        rep: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Application already submitted
        #[arg(long)]
        applied: bool,
        /// Application deadline
        #[arg(long, value_name = "DATE")]
        deadline: Option<String>,
    },
    /// List booths by company
    List(ListArgs),
    /// Show one booth with its questions
    Show(ShowArgs),
    /// Change fields of a booth
    Edit {
        /// Booth ID or unique ID prefix
        id: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long, value_name = "NAME")]
        rep: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, value_name = "BOOL")]
        applied: Option<bool>,
        #[arg(long, value_name = "DATE", conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Delete a booth from this device
    Delete {
        /// Booth ID or unique ID prefix
        id: String,
    },
    /// Add questions to ask, picked from the curated list or given explicitly
    Ask {
        /// Booth ID or unique ID prefix
        id: String,
        /// Own question text (skips the random pick)
        #[arg(long, value_name = "TEXT")]
        question: Option<String>,
        /// Number of random questions
        #[arg(short, long, default_value = "3")]
        count: usize,
        /// Only pick from this theme
        #[arg(long)]
        theme: Option<Theme>,
        /// Expect a yes/no answer
        #[arg(long)]
        yes_no: bool,
    },
    /// Record the answer to a question
    Answer {
        /// Booth ID or unique ID prefix
        id: String,
        /// Question number as shown by `booth show`
        number: usize,
        /// Answer text
        answer: Vec<String>,
    },
    /// Drop a question from a booth
    Forget {
        /// Booth ID or unique ID prefix
        id: String,
        /// Question number as shown by `booth show`
        number: usize,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ContactFields {
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub website: Option<String>,
    #[arg(long)]
    pub linkedin: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand)]
pub enum ContactCommands {
    /// Record someone you met
    #[command(alias = "new")]
    Add {
        /// Full name
        name: Vec<String>,
        #[command(flatten)]
        fields: ContactFields,
    },
    /// List contacts by name
    List(ListArgs),
    /// Show one contact
    Show(ShowArgs),
    /// Change fields of a contact
    Edit {
        /// Contact ID or unique ID prefix
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: ContactFields,
        /// Attach a voice note kept on this device only
        #[arg(long, value_name = "PATH")]
        audio: Option<PathBuf>,
    },
    /// Delete a contact from this device
    Delete {
        /// Contact ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Count local changes waiting to be pushed
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Timeout for each remote request
        #[arg(long, value_name = "SECS")]
        request_timeout_secs: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Login with Supabase email/password and store session in keychain
    Login {
        /// Supabase account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Supabase account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show auth status for profile
    Status,
    /// Logout profile and clear stored session
    Logout,
}
