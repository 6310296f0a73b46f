//! Lanyard CLI - track a conference from the terminal
//!
//! Sessions, booths and contacts live in a local database and are backed up
//! to Supabase with `lanyard sync`.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::booth::run_booth;
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::contact::run_contact;
use crate::commands::session::run_session;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let profile = cli.profile.as_deref();
    match cli.command {
        Commands::Session { command } => {
            run_session(command, &resolve_db_path(cli.db_path)?).await
        }
        Commands::Booth { command } => run_booth(command, &resolve_db_path(cli.db_path)?).await,
        Commands::Contact { command } => {
            run_contact(command, &resolve_db_path(cli.db_path)?).await
        }
        Commands::Sync { command } => {
            run_sync(command, profile, &resolve_db_path(cli.db_path)?).await
        }
        Commands::Config { command } => run_config(command, profile),
        Commands::Auth { command } => run_auth(command, profile).await,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let directive = if verbose { "lanyard=debug" } else { "lanyard=info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
