//! OpenAiCompatProvider -- concrete [`LlmProvider`] for OpenAI-style APIs.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the `Authorization` header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use kushlbot_core::llm::provider::LlmProvider;
use kushlbot_types::config::LlmConfig;
use kushlbot_types::llm::{CompletionRequest, CompletionResponse, LlmError, Usage};

use super::types::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};

/// Chat-completion client for any OpenAI-compatible endpoint.
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    name: String,
}

// No Debug derive: keeps the client and key out of log output entirely.

impl OpenAiCompatProvider {
    /// Build a provider from the `[llm]` config section.
    pub fn new(api_key: SecretString, config: &LlmConfig) -> Result<Self, LlmError> {
        Self::with_timeout(
            api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Build a provider with an explicit total request timeout.
    pub fn with_timeout(
        api_key: SecretString,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to create HTTP client: {e}")))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let name = provider_name(&base_url);

        Ok(Self {
            client,
            api_key,
            base_url,
            name,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn to_wire_request(request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    #[tracing::instrument(
        name = "llm.complete",
        skip(self, request),
        fields(provider = %self.name, model = %request.model, messages = request.messages.len())
    )]
    async fn send(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .post(self.url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&Self::to_wire_request(request))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if status != reqwest::StatusCode::OK {
            let message = upstream_error_message(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), %message, "Upstream returned an error");
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::Malformed(format!("failed to parse response: {e}")))?;

        if let Some(error) = &parsed.error {
            let message = error_value_message(error)
                .unwrap_or_else(|| format!("upstream returned HTTP {}", status.as_u16()));
            tracing::warn!(%message, "Upstream returned an error body with HTTP 200");
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| LlmError::Malformed("response has no completion content".to_string()))?;

        let usage = parsed.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        });

        tracing::debug!(
            chars = content.chars().count(),
            prompt_tokens = usage.as_ref().map(|u| u.prompt_tokens),
            "Completion received"
        );

        Ok(CompletionResponse {
            content,
            model: parsed.model,
            usage,
        })
    }
}

impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.send(request).await
    }
}

/// Host part of the base URL, used as the provider name in logs.
fn provider_name(base_url: &str) -> String {
    reqwest::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "openai-compatible".to_string())
}

fn map_reqwest_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Transport(e.to_string())
    }
}

/// Best human-readable message from a failed upstream response body.
///
/// Tries `error.message`, then `error` as a string, then the `error` JSON,
/// then the raw body, and finally a generic status line.
fn upstream_error_message(status: u16, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("error").and_then(error_value_message) {
            return message;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("upstream returned HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

fn error_value_message(error: &serde_json::Value) -> Option<String> {
    match error {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => match map.get("message") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => Some(error.to_string()),
        },
        other => Some(other.to_string()),
    }
}
