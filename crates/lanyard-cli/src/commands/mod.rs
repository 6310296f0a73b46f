pub mod auth_cmd;
pub mod booth;
pub mod common;
pub mod completions;
pub mod config;
pub mod contact;
pub mod session;
pub mod sync;
