//! Chat session and message types for KushlBot.
//!
//! A chat session is one conversation thread owned by a browser
//! (`SessionId`). Messages belong to exactly one chat session and are
//! ordered by creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::SessionId;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Title every chat starts with until its first exchange is answered.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// A conversation thread owned by one browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub session_id: SessionId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Bumped when the title is derived.
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// A fresh chat with the placeholder title and both timestamps at `now`.
    pub fn new(session_id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            title: DEFAULT_CHAT_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A chat session annotated with its message count, as shown in history lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u32,
}

/// A single message within a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Assigned by the store; strictly increasing across all chats.
    pub id: i64,
    pub chat_id: Uuid,
    pub session_id: SessionId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A message that has not been persisted yet (no id).
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub chat_id: Uuid,
    pub session_id: SessionId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewChatMessage {
    pub fn into_message(self, id: i64) -> ChatMessage {
        ChatMessage {
            id,
            chat_id: self.chat_id,
            session_id: self.session_id,
            role: self.role,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

/// Result of a successful send: the assistant reply and when it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}
