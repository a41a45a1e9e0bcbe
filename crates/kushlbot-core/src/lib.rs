//! Business logic and port (trait) definitions for KushlBot.
//!
//! This crate defines the traits that the infrastructure layer implements
//! (`ChatRepository`, `LlmProvider`) and the `ChatService` that drives them.
//! It depends only on `kushlbot-types` -- never on `kushlbot-infra` or any
//! database/HTTP crate.

pub mod chat;
pub mod llm;
