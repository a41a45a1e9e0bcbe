//! Context window assembly for the upstream request.

use kushlbot_types::chat::ChatMessage;
use kushlbot_types::llm::Message;

/// Turn the recent-message window into the ordered upstream message list.
///
/// `window` is expected oldest first. The window is read after the user
/// message was stored, so it normally already ends with `just_saved`; when a
/// concurrent request slipped a row in after it, `just_saved` is appended so
/// the model always sees the message it is answering last.
pub fn build_context(window: Vec<ChatMessage>, just_saved: &ChatMessage) -> Vec<Message> {
    let ends_with_new = window.last().is_some_and(|m| m.id == just_saved.id);

    let mut messages: Vec<Message> = window
        .into_iter()
        .map(|m| Message {
            role: m.role,
            content: m.content,
        })
        .collect();

    if !ends_with_new {
        messages.push(Message {
            role: just_saved.role,
            content: just_saved.content.clone(),
        });
    }

    messages
}
