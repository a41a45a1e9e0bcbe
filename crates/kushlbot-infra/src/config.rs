//! Configuration loading for KushlBot.
//!
//! Reads `config.toml` from the data directory (`~/.kushlbot/` by default)
//! into [`GlobalConfig`], falling back to defaults when the file is missing
//! or malformed, then layers environment overrides on top. Secrets are read
//! from the environment only.

use std::path::{Path, PathBuf};

use kushlbot_types::config::{DatabaseConfig, GlobalConfig};
use secrecy::SecretString;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "KUSHLBOT_DATA_DIR";

/// Resolve the data directory.
///
/// Priority: `KUSHLBOT_DATA_DIR`, then `~/.kushlbot`, then `./.kushlbot`.
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(|key| std::env::var(key).ok())
}

fn data_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".kushlbot");
    }

    PathBuf::from(".kushlbot")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`GlobalConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

/// Apply environment overrides (`PORT`) to a loaded config.
///
/// An unparsable `PORT` is ignored with a warning.
pub fn apply_env_overrides(config: &mut GlobalConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(raw) = lookup("PORT") {
        match raw.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(err) => tracing::warn!(value = %raw, "Ignoring invalid PORT: {err}"),
        }
    }
}

/// Absolute path of the SQLite file. Relative names resolve against `data_dir`.
pub fn database_path(data_dir: &Path, database: &DatabaseConfig) -> PathBuf {
    let file = Path::new(&database.file);
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        data_dir.join(file)
    }
}

/// Secrets read from the environment at startup.
pub struct AppSecrets {
    /// `OPENAI_API_KEY`; `None` when unset or blank.
    pub upstream_api_key: Option<SecretString>,
    /// `SECRET_KEY`, or a random per-process key when unset.
    pub session_key: SecretString,
    /// True when `session_key` was generated rather than configured.
    pub session_key_generated: bool,
}

impl AppSecrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let upstream_api_key = non_blank("OPENAI_API_KEY").map(SecretString::from);

        let (session_key, session_key_generated) = match non_blank("SECRET_KEY") {
            Some(key) => (SecretString::from(key), false),
            None => (SecretString::from(random_key()), true),
        };

        Self {
            upstream_api_key,
            session_key,
            session_key_generated,
        }
    }
}

/// 244 random bits, hex-encoded.
fn random_key() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}
