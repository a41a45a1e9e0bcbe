//! OpenAI-compatible chat-completion provider.
//!
//! [`OpenAiCompatProvider`] posts the context window to
//! `{base_url}/chat/completions` (OpenRouter by default) and maps the
//! answer, or the failure, onto [`LlmError`](kushlbot_types::llm::LlmError).

pub mod client;
pub mod types;

pub use client::OpenAiCompatProvider;
