//! Chat message types.
//!
//! This module contains types for representing messages in a chat session,
//! including roles, progress flags, and message identifier generation.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Represents the role of a message in a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the assistant backend.
    Assistant,
}

/// Presentation flags attached to a message at creation time.
///
/// `is_step` marks agent progress/lifecycle narration, rendered apart from
/// final answer content. `is_error` marks a transport or processing failure
/// surfaced to the user as a chat message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFlags {
    pub is_error: bool,
    pub is_step: bool,
}

impl MessageFlags {
    /// Flags for a step/lifecycle annotation message.
    pub fn step() -> Self {
        Self {
            is_error: false,
            is_step: true,
        }
    }

    /// Flags for an error message.
    pub fn error() -> Self {
        Self {
            is_error: true,
            is_step: false,
        }
    }
}

/// A single message in a chat session.
///
/// Role and identifier never change after creation. Content is write-once
/// for messages created under the new-bubble policy and append-only for the
/// running message of the combined policy; the timestamp is refreshed on
/// every append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier within the session.
    pub id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Timestamp when the message was created or last appended to (RFC 3339).
    pub timestamp: String,
    /// Whether this message surfaces a failure.
    #[serde(default)]
    pub is_error: bool,
    /// Whether this message is agent progress narration rather than content.
    #[serde(default)]
    pub is_step: bool,
}

impl Message {
    /// Creates a message with a freshly generated identifier and a current
    /// timestamp.
    pub fn new(id_prefix: &str, role: MessageRole, content: impl Into<String>, flags: MessageFlags) -> Self {
        Self {
            id: generate_message_id(id_prefix),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            is_error: flags.is_error,
            is_step: flags.is_step,
        }
    }
}

const ID_SUFFIX_LEN: usize = 7;
const ID_SUFFIX_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a message identifier of the form `<prefix>_<millis>_<suffix>`.
///
/// The suffix is 7 random base-36 characters. Under rapid generation the
/// timestamp collides, so uniqueness rests on the suffix alone; callers
/// treat the identifier as opaque and tolerate the residual collision risk.
pub fn generate_message_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ID_SUFFIX_CHARSET.len());
            ID_SUFFIX_CHARSET[idx] as char
        })
        .collect();
    format!(
        "{}_{}_{}",
        prefix,
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}
