//! ChatRepository trait definition.
//!
//! A repository instance is request-scoped: it owns one database
//! connection for the lifetime of a single HTTP request, which is why every
//! method takes `&mut self`.

use chrono::{DateTime, Utc};
use kushlbot_types::chat::{ChatMessage, ChatSession, ChatSummary, MessageRole, NewChatMessage};
use kushlbot_types::error::RepositoryError;
use kushlbot_types::identity::SessionId;
use uuid::Uuid;

/// Row counts removed by [`ChatRepository::clear_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearedRows {
    pub chats: u64,
    pub messages: u64,
}

/// Repository trait for chat session and message persistence.
///
/// Every query is scoped by the owning [`SessionId`]; a chat owned by
/// another browser behaves exactly like a missing one.
pub trait ChatRepository: Send {
    /// Insert a new chat session.
    fn create_chat(
        &mut self,
        chat: &ChatSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Fetch a chat if it exists and is owned by `owner`.
    fn find_chat(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// All chats owned by `owner` with message counts, ordered by updated_at DESC.
    fn list_chats(
        &mut self,
        owner: &SessionId,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSummary>, RepositoryError>> + Send;

    /// Set the title and bump updated_at, but only while the chat still has
    /// the default title. Returns whether a row changed; a chat that is
    /// already titled, absent, or foreign yields `false`.
    fn set_title_if_default(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete a chat's messages, then the chat. `NotFound` if no chat row matched.
    fn delete_chat(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete every message and chat owned by `owner`.
    fn clear_all(
        &mut self,
        owner: &SessionId,
    ) -> impl std::future::Future<Output = Result<ClearedRows, RepositoryError>> + Send;

    /// Persist a message and return it with its store-assigned id.
    fn save_message(
        &mut self,
        message: &NewChatMessage,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// All messages of a chat, ordered by created_at ASC (id breaks ties).
    fn get_messages(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// The `limit` most recent messages of a chat, returned oldest first.
    fn recent_messages(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Number of messages with the given role in a chat.
    fn count_messages(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
        role: MessageRole,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;
}
