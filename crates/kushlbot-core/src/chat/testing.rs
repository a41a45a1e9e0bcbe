//! In-memory fakes for exercising `ChatService` without a database or network.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use kushlbot_types::chat::{
    ChatMessage, ChatSession, ChatSummary, DEFAULT_CHAT_TITLE, MessageRole, NewChatMessage,
};
use kushlbot_types::error::RepositoryError;
use kushlbot_types::identity::SessionId;
use kushlbot_types::llm::{CompletionRequest, CompletionResponse, LlmError};
use uuid::Uuid;

use crate::chat::repository::{ChatRepository, ClearedRows};
use crate::llm::provider::LlmProvider;

#[derive(Default)]
struct Tables {
    chats: Vec<ChatSession>,
    messages: Vec<ChatMessage>,
    next_id: i64,
}

/// Vec-backed repository. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryChatRepository {
    tables: Arc<Mutex<Tables>>,
}

impl ChatRepository for MemoryChatRepository {
    async fn create_chat(&mut self, chat: &ChatSession) -> Result<(), RepositoryError> {
        self.tables.lock().unwrap().chats.push(chat.clone());
        Ok(())
    }

    async fn find_chat(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .chats
            .iter()
            .find(|c| c.id == *chat_id && c.session_id == *owner)
            .cloned())
    }

    async fn list_chats(&mut self, owner: &SessionId) -> Result<Vec<ChatSummary>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let mut chats: Vec<ChatSummary> = tables
            .chats
            .iter()
            .filter(|c| c.session_id == *owner)
            .map(|c| ChatSummary {
                id: c.id,
                title: c.title.clone(),
                created_at: c.created_at,
                updated_at: c.updated_at,
                message_count: tables.messages.iter().filter(|m| m.chat_id == c.id).count() as u32,
            })
            .collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(chats)
    }

    async fn set_title_if_default(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
        title: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(chat) = tables.chats.iter_mut().find(|c| {
            c.id == *chat_id && c.session_id == *owner && c.title == DEFAULT_CHAT_TITLE
        }) else {
            return Ok(false);
        };
        chat.title = title.to_string();
        chat.updated_at = updated_at;
        Ok(true)
    }

    async fn delete_chat(&mut self, chat_id: &Uuid, owner: &SessionId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables
            .messages
            .retain(|m| !(m.chat_id == *chat_id && m.session_id == *owner));
        let before = tables.chats.len();
        tables
            .chats
            .retain(|c| !(c.id == *chat_id && c.session_id == *owner));
        if tables.chats.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear_all(&mut self, owner: &SessionId) -> Result<ClearedRows, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let messages_before = tables.messages.len();
        tables.messages.retain(|m| m.session_id != *owner);
        let chats_before = tables.chats.len();
        tables.chats.retain(|c| c.session_id != *owner);
        Ok(ClearedRows {
            chats: (chats_before - tables.chats.len()) as u64,
            messages: (messages_before - tables.messages.len()) as u64,
        })
    }

    async fn save_message(&mut self, message: &NewChatMessage) -> Result<ChatMessage, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        tables.next_id += 1;
        let stored = message.clone().into_message(tables.next_id);
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    async fn get_messages(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.chat_id == *chat_id && m.session_id == *owner)
            .cloned()
            .collect())
    }

    async fn recent_messages(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let all = self.get_messages(chat_id, owner).await?;
        let skip = all.len().saturating_sub(limit as usize);
        Ok(all.into_iter().skip(skip).collect())
    }

    async fn count_messages(
        &mut self,
        chat_id: &Uuid,
        owner: &SessionId,
        role: MessageRole,
    ) -> Result<u32, RepositoryError> {
        let all = self.get_messages(chat_id, owner).await?;
        Ok(all.iter().filter(|m| m.role == role).count() as u32)
    }
}

/// What the stub provider does with each request.
pub enum StubBehavior {
    /// Answer with the content of the last message.
    Echo,
    Reply(String),
    Timeout,
    Upstream(u16, String),
}

/// Provider that records requests and answers according to a `StubBehavior`.
pub struct StubProvider {
    behavior: StubBehavior,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl StubProvider {
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl LlmProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        let content = match &self.behavior {
            StubBehavior::Echo => request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default(),
            StubBehavior::Reply(text) => text.clone(),
            StubBehavior::Timeout => return Err(LlmError::Timeout),
            StubBehavior::Upstream(status, message) => {
                return Err(LlmError::Upstream {
                    status: *status,
                    message: message.clone(),
                });
            }
        };

        Ok(CompletionResponse {
            content,
            model: Some(request.model.clone()),
            usage: None,
        })
    }
}
