//! Shared domain types for KushlBot.
//!
//! This crate contains the domain types used across the workspace:
//! chat sessions, chat messages, the anonymous browser session identity,
//! LLM request/response shapes, configuration, and the error enums.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
