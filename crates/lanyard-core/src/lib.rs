//! lanyard-core - Core library for Lanyard
//!
//! Records for sessions, booths and contacts, the local offline store, the
//! Supabase-backed remote store and the sync orchestrator that keeps the two
//! in step. Used by the `lanyard` CLI.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod questions;
pub mod remote;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Booth, BoothQuestion, Contact, QuestionKind, RecordId, Session, SyncStatus};
pub use sync::{SyncOrchestrator, SyncOutcome, SyncRecord, SyncReport, Table, TableReport};
