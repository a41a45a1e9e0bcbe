//! Global configuration types for KushlBot.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! listen address, the database file, and the upstream model parameters.
//! Secrets never live here; they come from the environment.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.kushlbot/config.toml`. All fields have sensible defaults,
/// so an empty or missing file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub llm: LlmConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Lifetime of the browser session cookie.
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    10_000
}

fn default_session_ttl_days() -> u32 {
    31
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_ttl_days: default_session_ttl_days(),
        }
    }
}

/// SQLite storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file name, resolved against the data directory when relative.
    #[serde(default = "default_database_file")]
    pub file: String,
}

fn default_database_file() -> String {
    "chat_history.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: default_database_file(),
        }
    }
}

/// Upstream chat-completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How many recent messages are sent upstream with each request.
    #[serde(default = "default_context_window")]
    pub context_window: u32,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "mistralai/mistral-7b-instruct".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_context_window() -> u32 {
    10
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            context_window: default_context_window(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert_eq!(config.server.port, 10_000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.file, "chat_history.db");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.context_window, 10);
        assert_eq!(config.llm.model, "mistralai/mistral-7b-instruct");
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 10_000);
        assert_eq!(config.llm.max_tokens, 1000);
    }

    #[test]
    fn test_global_config_partial_sections() {
        let toml_str = r#"
[server]
port = 5000

[llm]
model = "openai/gpt-4o-mini"
temperature = 0.2
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert!((config.llm.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.llm.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.database.file, "chat_history.db");
    }
}
