//! Session domain model.
//!
//! This module contains the core ChatSession entity that represents one
//! conversation with an assistant backend.

use super::message::{Message, generate_message_id};
use serde::{Deserialize, Serialize};

/// Maximum number of characters of the first user message used as the title.
pub const TITLE_MAX_CHARS: usize = 20;

/// Title assigned to a session before the first user message arrives.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Represents one chat session.
///
/// A session contains:
/// - The ordered message history (user and assistant messages)
/// - The agent profile the session talks to
/// - A title derived from the first user message
/// - The last-activity timestamp used for sorting the session list
///
/// Sessions are created on explicit user action, mutated only by
/// message-append operations, and persist until explicitly deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session identifier (`chat_<millis>_<suffix>` format)
    pub id: String,
    /// Human-readable session title
    pub title: String,
    /// Ordered message history
    pub messages: Vec<Message>,
    /// Identifier of the agent profile this session is bound to
    pub agent_id: String,
    /// Timestamp of the last message activity (RFC 3339 format)
    pub last_message_time: String,
}

impl ChatSession {
    /// Creates an empty session bound to the given agent profile.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            id: generate_message_id("chat"),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            agent_id: agent_id.into(),
            last_message_time: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Returns how many user messages the session holds.
    pub fn user_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == super::message::MessageRole::User)
            .count()
    }
}

/// Derives a session title from the first user message.
///
/// The content is truncated to [`TITLE_MAX_CHARS`] characters with a
/// trailing `...` when longer; shorter content is used unchanged.
pub fn derive_title(content: &str) -> String {
    let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
    if content.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_becomes_title_unchanged() {
        assert_eq!(derive_title("Plan a trip"), "Plan a trip");
    }

    #[test]
    fn long_content_is_truncated_with_ellipsis() {
        let content = "Please plan a two-week trip through Japan";
        let title = derive_title(content);
        assert_eq!(title, "Please plan a two-we...");
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let content = "こんにちは世界こんにちは世界こんにちは世界こんにちは";
        let title = derive_title(content);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS + 3);
    }

    #[test]
    fn new_session_has_default_title() {
        let session = ChatSession::new("super-agent");
        assert_eq!(session.title, DEFAULT_TITLE);
        assert!(session.id.starts_with("chat_"));
        assert!(session.messages.is_empty());
    }
}
