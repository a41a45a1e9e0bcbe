//! Chat JSON handlers.
//!
//! Endpoints:
//! - POST   /api/chat/new           - Create an empty chat
//! - GET    /api/chat/history       - List the caller's chats
//! - GET    /api/chat/{id}/messages - Messages of one chat
//! - POST   /api/chat/{id}          - Send a message and get the reply
//! - DELETE /api/chat/{id}          - Delete one chat
//! - POST   /api/chat/clear-all     - Delete every chat of the caller

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kushlbot_types::chat::{ChatMessage, ChatSummary, MessageRole};
use kushlbot_types::error::ChatError;
use kushlbot_types::identity::SessionId;

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreateChatResponse {
    pub chat_id: Uuid,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub chats: Vec<ChatSummary>,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for MessageView {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content,
            timestamp: message.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Chat ids are UUIDs; anything else cannot name an existing chat.
fn parse_chat_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse::<Uuid>().map_err(|_| AppError(ChatError::NotFound))
}

/// POST /api/chat/new
pub async fn create_chat(
    State(state): State<AppState>,
    Extension(owner): Extension<SessionId>,
) -> Result<Json<CreateChatResponse>, AppError> {
    let mut service = state.chat_service().await?;
    let chat_id = service.create_chat(&owner).await?;

    Ok(Json(CreateChatResponse {
        chat_id,
        success: true,
    }))
}

/// GET /api/chat/history
pub async fn history(
    State(state): State<AppState>,
    Extension(owner): Extension<SessionId>,
) -> Result<Json<HistoryResponse>, AppError> {
    let mut service = state.chat_service().await?;
    let chats = service.list_chats(&owner).await?;

    Ok(Json(HistoryResponse { chats }))
}

/// GET /api/chat/{id}/messages
pub async fn messages(
    State(state): State<AppState>,
    Extension(owner): Extension<SessionId>,
    Path(chat_id): Path<String>,
) -> Result<Json<MessagesResponse>, AppError> {
    let chat_id = parse_chat_id(&chat_id)?;

    let mut service = state.chat_service().await?;
    let messages = service.get_messages(&owner, &chat_id).await?;

    Ok(Json(MessagesResponse {
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

/// POST /api/chat/{id}
///
/// A missing, non-JSON, or malformed body is treated like an empty message.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(owner): Extension<SessionId>,
    Path(chat_id): Path<String>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let text = match body {
        Ok(Json(request)) => request.message,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected chat message body");
            None
        }
    };

    // Validate before touching the database.
    if text.as_deref().is_none_or(str::is_empty) {
        return Err(AppError(ChatError::InvalidInput("Message is required".to_string())));
    }

    let chat_id = parse_chat_id(&chat_id)?;

    let mut service = state.chat_service().await?;
    let reply = service
        .send_message(&owner, &chat_id, text.as_deref())
        .await?;

    Ok(Json(SendMessageResponse {
        response: reply.response,
        timestamp: reply.timestamp,
    }))
}

/// DELETE /api/chat/{id}
pub async fn delete_chat(
    State(state): State<AppState>,
    Extension(owner): Extension<SessionId>,
    Path(chat_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let chat_id = parse_chat_id(&chat_id)?;

    let mut service = state.chat_service().await?;
    service.delete_chat(&owner, &chat_id).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/chat/clear-all
pub async fn clear_all(
    State(state): State<AppState>,
    Extension(owner): Extension<SessionId>,
) -> Result<Json<SuccessResponse>, AppError> {
    let mut service = state.chat_service().await?;
    service.clear_all(&owner).await?;

    Ok(Json(SuccessResponse { success: true }))
}
