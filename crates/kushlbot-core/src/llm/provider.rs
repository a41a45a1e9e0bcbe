//! LlmProvider trait definition.
//!
//! Uses RPITIT (Rust 2024 edition) for `complete`, so implementations are
//! plain `async fn`s.

use kushlbot_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for chat-completion backends.
///
/// Implementations live in kushlbot-infra (e.g., `OpenAiCompatProvider`).
/// A single call is made per user message: no retries, no streaming.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    ///
    /// Implementations enforce their own request timeout and report it as
    /// [`LlmError::Timeout`].
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
