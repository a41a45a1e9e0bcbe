//! Chat title derivation.
//!
//! A chat is titled once, from its first user message after that message
//! is answered. The title is the first 50 characters of that message, with
//! `...` appended when anything was cut.

/// Maximum number of characters kept from the user message.
pub const TITLE_MAX_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

/// Derive a chat title from the first user message.
///
/// Counts Unicode scalar values, not bytes, so multi-byte text is never
/// split mid-character.
pub fn derive_title(first_user_message: &str) -> String {
    let mut chars = first_user_message.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();

    if chars.next().is_some() {
        format!("{head}{ELLIPSIS}")
    } else {
        head
    }
}
