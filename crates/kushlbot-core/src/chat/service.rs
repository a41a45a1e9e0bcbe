//! Chat service orchestrating chat CRUD and the inference round-trip.
//!
//! A `ChatService` is built per request around a request-scoped
//! repository. Every operation takes the caller's [`SessionId`] and checks
//! ownership before touching a chat.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use kushlbot_types::chat::{
    ChatMessage, ChatReply, ChatSession, ChatSummary, MessageRole, NewChatMessage,
};
use kushlbot_types::config::LlmConfig;
use kushlbot_types::error::{ChatError, RepositoryError};
use kushlbot_types::identity::SessionId;
use kushlbot_types::llm::CompletionRequest;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::context::build_context;
use crate::chat::repository::{ChatRepository, ClearedRows};
use crate::chat::title::derive_title;
use crate::llm::provider::LlmProvider;

/// Fixed parameters of every upstream request.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub context_window: u32,
}

impl From<&LlmConfig> for CompletionSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            context_window: config.context_window,
        }
    }
}

/// Chat CRUD plus the send-message proxy flow.
///
/// Generic over `ChatRepository` and `LlmProvider` to maintain clean
/// architecture (kushlbot-core never depends on kushlbot-infra).
pub struct ChatService<R: ChatRepository, P: LlmProvider> {
    repo: R,
    provider: Arc<P>,
    settings: CompletionSettings,
}

impl<R: ChatRepository, P: LlmProvider> ChatService<R, P> {
    pub fn new(repo: R, provider: Arc<P>, settings: CompletionSettings) -> Self {
        Self {
            repo,
            provider,
            settings,
        }
    }

    /// Release the service, handing back the repository (and its connection).
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Create an empty chat titled "New Chat" and return its id.
    pub async fn create_chat(&mut self, owner: &SessionId) -> Result<Uuid, ChatError> {
        let chat = ChatSession::new(owner.clone(), Utc::now());
        self.repo.create_chat(&chat).await?;
        info!(chat_id = %chat.id, "Chat created");
        Ok(chat.id)
    }

    /// Chats owned by `owner`, most recently updated first.
    pub async fn list_chats(&mut self, owner: &SessionId) -> Result<Vec<ChatSummary>, ChatError> {
        Ok(self.repo.list_chats(owner).await?)
    }

    /// All messages of an owned chat, oldest first.
    pub async fn get_messages(
        &mut self,
        owner: &SessionId,
        chat_id: &Uuid,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.require_chat(owner, chat_id).await?;
        Ok(self.repo.get_messages(chat_id, owner).await?)
    }

    /// Delete an owned chat together with its messages.
    pub async fn delete_chat(&mut self, owner: &SessionId, chat_id: &Uuid) -> Result<(), ChatError> {
        self.require_chat(owner, chat_id).await?;
        self.repo
            .delete_chat(chat_id, owner)
            .await
            .map_err(not_found_as_chat_error)?;
        info!(chat_id = %chat_id, "Chat deleted");
        Ok(())
    }

    /// Delete every chat and message owned by `owner`.
    pub async fn clear_all(&mut self, owner: &SessionId) -> Result<ClearedRows, ChatError> {
        let cleared = self.repo.clear_all(owner).await?;
        info!(
            chats = cleared.chats,
            messages = cleared.messages,
            "Cleared all chats for session"
        );
        Ok(cleared)
    }

    /// Store the user's message, ask the model, store and return its reply.
    ///
    /// The text is stored and forwarded exactly as given. The user message is
    /// persisted before the upstream call and stays persisted when that call
    /// fails. The title is derived only from the chat's first user message,
    /// once that message has been answered.
    pub async fn send_message(
        &mut self,
        owner: &SessionId,
        chat_id: &Uuid,
        text: Option<&str>,
    ) -> Result<ChatReply, ChatError> {
        let text = match text {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(ChatError::InvalidInput("Message is required".to_string())),
        };

        self.require_chat(owner, chat_id).await?;

        let first_user_message = self
            .repo
            .count_messages(chat_id, owner, MessageRole::User)
            .await?
            == 0;

        let user_message = self
            .repo
            .save_message(&NewChatMessage {
                chat_id: *chat_id,
                session_id: owner.clone(),
                role: MessageRole::User,
                content: text.clone(),
                created_at: Utc::now(),
            })
            .await?;

        let window = self
            .repo
            .recent_messages(chat_id, owner, self.settings.context_window)
            .await?;

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: build_context(window, &user_message),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let started = Instant::now();
        let completion = match self.provider.complete(&request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(
                    chat_id = %chat_id,
                    provider = self.provider.name(),
                    error = %e,
                    "Completion failed; user message kept without reply"
                );
                return Err(e.into());
            }
        };

        let reply = self
            .repo
            .save_message(&NewChatMessage {
                chat_id: *chat_id,
                session_id: owner.clone(),
                role: MessageRole::Assistant,
                content: completion.content,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            chat_id = %chat_id,
            context_messages = request.messages.len(),
            response_ms = started.elapsed().as_millis() as u64,
            "Assistant reply stored"
        );

        if first_user_message {
            let title = derive_title(&text);
            let applied = self
                .repo
                .set_title_if_default(chat_id, owner, &title, Utc::now())
                .await?;
            if applied {
                info!(chat_id = %chat_id, "Chat title derived from first message");
            } else {
                debug!(chat_id = %chat_id, "Chat already titled; keeping existing title");
            }
        }

        Ok(ChatReply {
            response: reply.content,
            timestamp: reply.created_at,
        })
    }

    async fn require_chat(
        &mut self,
        owner: &SessionId,
        chat_id: &Uuid,
    ) -> Result<ChatSession, ChatError> {
        self.repo
            .find_chat(chat_id, owner)
            .await?
            .ok_or(ChatError::NotFound)
    }
}

// A row vanishing between the ownership check and the write (a concurrent
// delete) is reported as the chat being gone, not as a storage failure.
fn not_found_as_chat_error(e: RepositoryError) -> ChatError {
    match e {
        RepositoryError::NotFound => ChatError::NotFound,
        other => ChatError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{MemoryChatRepository, StubBehavior, StubProvider};
    use kushlbot_types::chat::DEFAULT_CHAT_TITLE;

    fn settings() -> CompletionSettings {
        CompletionSettings::from(&LlmConfig::default())
    }

    fn service(
        repo: MemoryChatRepository,
        behavior: StubBehavior,
    ) -> (ChatService<MemoryChatRepository, StubProvider>, Arc<StubProvider>) {
        let provider = Arc::new(StubProvider::new(behavior));
        (ChatService::new(repo, provider.clone(), settings()), provider)
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let (mut svc, _) = service(MemoryChatRepository::default(), StubBehavior::Echo);
        let owner = SessionId::generate();

        let id = svc.create_chat(&owner).await.unwrap();
        let chats = svc.list_chats(&owner).await.unwrap();

        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].id, id);
        assert_eq!(chats[0].title, DEFAULT_CHAT_TITLE);
        assert_eq!(chats[0].message_count, 0);
    }

    #[tokio::test]
    async fn test_send_message_persists_pair_and_sets_title() {
        let (mut svc, _) = service(
            MemoryChatRepository::default(),
            StubBehavior::Reply("General Kenobi".to_string()),
        );
        let owner = SessionId::generate();
        let chat_id = svc.create_chat(&owner).await.unwrap();

        let reply = svc
            .send_message(&owner, &chat_id, Some("Hello there"))
            .await
            .unwrap();
        assert_eq!(reply.response, "General Kenobi");

        let messages = svc.get_messages(&owner, &chat_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "Hello there");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "General Kenobi");
        assert_eq!(reply.timestamp, messages[1].created_at);

        let chats = svc.list_chats(&owner).await.unwrap();
        assert_eq!(chats[0].title, "Hello there");
        assert_eq!(chats[0].message_count, 2);
    }

    #[tokio::test]
    async fn test_title_not_overwritten_by_second_message() {
        let (mut svc, _) = service(MemoryChatRepository::default(), StubBehavior::Echo);
        let owner = SessionId::generate();
        let chat_id = svc.create_chat(&owner).await.unwrap();
        let long = "x".repeat(70);

        svc.send_message(&owner, &chat_id, Some(&long)).await.unwrap();
        svc.send_message(&owner, &chat_id, Some("something else"))
            .await
            .unwrap();

        let chats = svc.list_chats(&owner).await.unwrap();
        assert_eq!(chats[0].title, format!("{}...", "x".repeat(50)));
    }

    #[tokio::test]
    async fn test_missing_or_blank_message_is_invalid_and_writes_nothing() {
        let (mut svc, provider) = service(MemoryChatRepository::default(), StubBehavior::Echo);
        let owner = SessionId::generate();
        let chat_id = svc.create_chat(&owner).await.unwrap();

        for text in [None, Some("")] {
            let err = svc.send_message(&owner, &chat_id, text).await.unwrap_err();
            assert!(matches!(err, ChatError::InvalidInput(_)));
        }

        assert!(svc.get_messages(&owner, &chat_id).await.unwrap().is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_foreign_chat_is_not_found() {
        let (mut svc, provider) = service(MemoryChatRepository::default(), StubBehavior::Echo);
        let alice = SessionId::generate();
        let mallory = SessionId::generate();
        let chat_id = svc.create_chat(&alice).await.unwrap();
        svc.send_message(&alice, &chat_id, Some("secret plans"))
            .await
            .unwrap();

        let err = svc
            .send_message(&mallory, &chat_id, Some("show me"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound));
        assert!(matches!(
            svc.get_messages(&mallory, &chat_id).await.unwrap_err(),
            ChatError::NotFound
        ));
        assert!(matches!(
            svc.delete_chat(&mallory, &chat_id).await.unwrap_err(),
            ChatError::NotFound
        ));
        assert!(svc.list_chats(&mallory).await.unwrap().is_empty());

        // Only alice's single exchange reached the provider.
        assert_eq!(provider.calls(), 1);
        assert_eq!(svc.get_messages(&alice, &chat_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_user_message_only() {
        let (mut svc, _) = service(
            MemoryChatRepository::default(),
            StubBehavior::Upstream(500, "model exploded".to_string()),
        );
        let owner = SessionId::generate();
        let chat_id = svc.create_chat(&owner).await.unwrap();

        let err = svc
            .send_message(&owner, &chat_id, Some("Hello there"))
            .await
            .unwrap_err();
        match err {
            ChatError::Upstream(msg) => assert_eq!(msg, "model exploded"),
            other => panic!("unexpected error: {other:?}"),
        }

        let messages = svc.get_messages(&owner, &chat_id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::User);

        let chats = svc.list_chats(&owner).await.unwrap();
        assert_eq!(chats[0].title, DEFAULT_CHAT_TITLE);
    }

    #[tokio::test]
    async fn test_timeout_keeps_user_message_only() {
        let (mut svc, _) = service(MemoryChatRepository::default(), StubBehavior::Timeout);
        let owner = SessionId::generate();
        let chat_id = svc.create_chat(&owner).await.unwrap();

        let err = svc
            .send_message(&owner, &chat_id, Some("anyone there?"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Timeout));

        let messages = svc.get_messages(&owner, &chat_id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "anyone there?");
    }

    #[tokio::test]
    async fn test_title_stays_default_when_first_message_failed() {
        let repo = MemoryChatRepository::default();
        let owner = SessionId::generate();

        let (mut failing, _) = service(repo.clone(), StubBehavior::Timeout);
        let chat_id = failing.create_chat(&owner).await.unwrap();
        let _ = failing
            .send_message(&owner, &chat_id, Some("first user message"))
            .await;

        let (mut working, _) = service(repo, StubBehavior::Echo);
        working
            .send_message(&owner, &chat_id, Some("second user message"))
            .await
            .unwrap();

        let chats = working.list_chats(&owner).await.unwrap();
        assert_eq!(chats[0].title, DEFAULT_CHAT_TITLE);
        assert_eq!(chats[0].message_count, 3);
    }

    #[tokio::test]
    async fn test_message_text_is_stored_and_forwarded_verbatim() {
        let (mut svc, provider) = service(MemoryChatRepository::default(), StubBehavior::Echo);
        let owner = SessionId::generate();
        let chat_id = svc.create_chat(&owner).await.unwrap();
        let code = "    fn main() {}\n";

        svc.send_message(&owner, &chat_id, Some(code)).await.unwrap();

        let messages = svc.get_messages(&owner, &chat_id).await.unwrap();
        assert_eq!(messages[0].content, code);
        let sent = provider.last_request().unwrap();
        assert_eq!(sent.messages.last().unwrap().content, code);

        let chats = svc.list_chats(&owner).await.unwrap();
        assert_eq!(chats[0].title, code);
    }

    #[tokio::test]
    async fn test_whitespace_only_message_is_accepted() {
        let (mut svc, provider) = service(MemoryChatRepository::default(), StubBehavior::Echo);
        let owner = SessionId::generate();
        let chat_id = svc.create_chat(&owner).await.unwrap();

        svc.send_message(&owner, &chat_id, Some("   ")).await.unwrap();

        let messages = svc.get_messages(&owner, &chat_id).await.unwrap();
        assert_eq!(messages[0].content, "   ");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_context_window_is_bounded_and_ends_with_new_message() {
        let (mut svc, provider) = service(MemoryChatRepository::default(), StubBehavior::Echo);
        let owner = SessionId::generate();
        let chat_id = svc.create_chat(&owner).await.unwrap();

        for i in 0..7 {
            svc.send_message(&owner, &chat_id, Some(&format!("question {i}")))
                .await
                .unwrap();
        }

        let last = provider.last_request().unwrap();
        assert_eq!(last.messages.len(), 10);
        let tail = last.messages.last().unwrap();
        assert_eq!(tail.role, MessageRole::User);
        assert_eq!(tail.content, "question 6");
        assert_eq!(last.model, "mistralai/mistral-7b-instruct");
        assert_eq!(last.max_tokens, 1000);
    }

    #[tokio::test]
    async fn test_delete_then_get_messages_is_not_found() {
        let (mut svc, _) = service(MemoryChatRepository::default(), StubBehavior::Echo);
        let owner = SessionId::generate();
        let chat_id = svc.create_chat(&owner).await.unwrap();
        svc.send_message(&owner, &chat_id, Some("hi")).await.unwrap();

        svc.delete_chat(&owner, &chat_id).await.unwrap();

        assert!(matches!(
            svc.get_messages(&owner, &chat_id).await.unwrap_err(),
            ChatError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_clear_all_only_touches_owner() {
        let (mut svc, _) = service(MemoryChatRepository::default(), StubBehavior::Echo);
        let alice = SessionId::generate();
        let bob = SessionId::generate();

        let a1 = svc.create_chat(&alice).await.unwrap();
        svc.create_chat(&alice).await.unwrap();
        let b1 = svc.create_chat(&bob).await.unwrap();
        svc.send_message(&alice, &a1, Some("one")).await.unwrap();
        svc.send_message(&bob, &b1, Some("two")).await.unwrap();

        let cleared = svc.clear_all(&alice).await.unwrap();
        assert_eq!(cleared, ClearedRows { chats: 2, messages: 2 });

        assert!(svc.list_chats(&alice).await.unwrap().is_empty());
        assert_eq!(svc.list_chats(&bob).await.unwrap().len(), 1);
        assert_eq!(svc.get_messages(&bob, &b1).await.unwrap().len(), 2);
    }
}
