//! Local database layer for Lanyard

mod connection;
mod migrations;
mod store;
mod tracker;

pub use connection::Database;
pub use store::{LocalStore, SqliteStore};
pub use tracker::Tracker;
