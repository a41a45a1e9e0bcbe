//! SQLite storage layer.
//!
//! Schema bootstrap, per-request connections, and the chat repository.

pub mod chat;
pub mod database;
pub mod schema;
