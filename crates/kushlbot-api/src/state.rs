//! Application state wiring configuration, storage, and the upstream client.
//!
//! `AppState` is immutable after startup. Chat services are built per
//! request around a fresh SQLite connection via [`AppState::chat_service`].

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use kushlbot_core::chat::service::{ChatService, CompletionSettings};
use kushlbot_infra::config::{AppSecrets, database_path};
use kushlbot_infra::crypto::session_token::SessionSigner;
use kushlbot_infra::llm::openai_compat::OpenAiCompatProvider;
use kushlbot_infra::sqlite::chat::SqliteChatRepository;
use kushlbot_infra::sqlite::database::Database;
use kushlbot_types::config::GlobalConfig;
use kushlbot_types::error::ChatError;

/// Chat service pinned to the concrete infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository, OpenAiCompatProvider>;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db: Database,
    pub provider: Arc<OpenAiCompatProvider>,
    pub signer: Arc<SessionSigner>,
    pub settings: Arc<CompletionSettings>,
}

impl AppState {
    /// Open the database and build the upstream client and cookie signer.
    pub async fn init(
        data_dir: PathBuf,
        config: GlobalConfig,
        secrets: AppSecrets,
    ) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_path = database_path(&data_dir, &config.database);
        let db = Database::open(&db_path).await?;
        tracing::info!(path = %db_path.display(), "Database ready");

        if secrets.upstream_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; upstream requests will be rejected");
        }
        if secrets.session_key_generated {
            tracing::warn!("SECRET_KEY is not set; using a random key, sessions will not survive a restart");
        }

        let api_key = secrets
            .upstream_api_key
            .unwrap_or_else(|| SecretString::from(String::new()));
        let provider = OpenAiCompatProvider::new(api_key, &config.llm)?;
        let signer = SessionSigner::new(&secrets.session_key)?;
        let settings = CompletionSettings::from(&config.llm);

        Ok(Self {
            config: Arc::new(config),
            data_dir,
            db,
            provider: Arc::new(provider),
            signer: Arc::new(signer),
            settings: Arc::new(settings),
        })
    }

    /// Build a chat service around a new connection for one request.
    ///
    /// The connection closes when the returned service is dropped.
    pub async fn chat_service(&self) -> Result<ConcreteChatService, ChatError> {
        let conn = self.db.connect().await?;
        Ok(ChatService::new(
            SqliteChatRepository::new(conn),
            Arc::clone(&self.provider),
            CompletionSettings::clone(&self.settings),
        ))
    }
}
