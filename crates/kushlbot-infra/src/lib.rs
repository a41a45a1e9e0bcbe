//! Infrastructure layer for KushlBot.
//!
//! Contains implementations of the traits defined in `kushlbot-core`:
//! SQLite storage (one connection per request), the OpenAI-compatible
//! upstream client, session-cookie signing, and configuration loading.

pub mod config;
pub mod crypto;
pub mod llm;
pub mod sqlite;
