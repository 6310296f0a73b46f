//! Bidirectional sync between the local store and the remote backup.
//!
//! One pass pushes every dirty record, then pulls the whole remote table and
//! adopts rows that are strictly newer than the local copy (last writer wins
//! on `updated_at`). Tables are processed one after another in [`Table::ALL`]
//! order, and a remote failure in one table never stops the others.

mod orchestrator;
mod record;
mod report;

pub use orchestrator::SyncOrchestrator;
pub use record::{SyncRecord, Table};
pub use report::{SyncOutcome, SyncReport, TableReport};
