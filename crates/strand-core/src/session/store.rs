//! In-memory session store backed by a persistence repository.
//!
//! `SessionStore` owns the session list and the active-session marker. Every
//! mutation is written through to the injected [`SessionRepository`] before
//! the call returns (save-after-mutate), so a crash never loses more than
//! the mutation in flight.

use super::message::{Message, MessageFlags, MessageRole};
use super::model::{ChatSession, derive_title};
use super::repository::SessionRepository;
use crate::error::{Result, StrandError};
use crate::ingest::MessageSink;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Owns the chat sessions and applies all message mutations.
///
/// The store is the single writer of session state. Streaming ingestion
/// reaches it through the [`MessageSink`] trait; the application layer uses
/// the session CRUD operations directly.
pub struct SessionStore {
    /// Session list in creation order
    sessions: RwLock<Vec<ChatSession>>,
    /// Identifier of the currently selected session
    active_id: RwLock<Option<String>>,
    /// Persistent storage backend
    repository: Arc<dyn SessionRepository>,
}

impl SessionStore {
    /// Creates a store and restores persisted sessions and the active
    /// session marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be read.
    pub async fn load(repository: Arc<dyn SessionRepository>) -> Result<Self> {
        let mut sessions = repository.list_all().await?;
        // list_all returns most-recent-first; keep creation order in memory
        // so deletion falls back to the oldest remaining session.
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        let active_id = repository.get_active_session_id().await?;

        tracing::info!(
            "[SessionStore] Restored {} session(s), active: {:?}",
            sessions.len(),
            active_id
        );

        Ok(Self {
            sessions: RwLock::new(sessions),
            active_id: RwLock::new(active_id),
            repository,
        })
    }

    /// Creates a new session bound to the given agent profile and makes it
    /// active.
    pub async fn create_session(&self, agent_id: &str) -> Result<ChatSession> {
        let session = ChatSession::new(agent_id);

        {
            let mut sessions = self.sessions.write().await;
            sessions.push(session.clone());
        }
        *self.active_id.write().await = Some(session.id.clone());

        self.repository.save(&session).await?;
        self.repository.set_active_session_id(&session.id).await?;

        tracing::info!("[SessionStore] Created session {}", session.id);
        Ok(session)
    }

    /// Selects an existing session as active.
    ///
    /// # Errors
    ///
    /// Returns [`StrandError::NotFound`] if no session with the given ID
    /// exists.
    pub async fn select_session(&self, session_id: &str) -> Result<()> {
        {
            let sessions = self.sessions.read().await;
            if !sessions.iter().any(|s| s.id == session_id) {
                return Err(StrandError::not_found("session", session_id));
            }
        }

        *self.active_id.write().await = Some(session_id.to_string());
        self.repository.set_active_session_id(session_id).await?;
        Ok(())
    }

    /// Returns the ID of the currently active session.
    pub async fn active_session_id(&self) -> Option<String> {
        self.active_id.read().await.clone()
    }

    /// Returns a snapshot of the currently active session.
    pub async fn active_session(&self) -> Option<ChatSession> {
        let active_id = self.active_id.read().await.clone()?;
        let sessions = self.sessions.read().await;
        sessions.iter().find(|s| s.id == active_id).cloned()
    }

    /// Returns a snapshot of a session by ID.
    pub async fn find_session(&self, session_id: &str) -> Option<ChatSession> {
        let sessions = self.sessions.read().await;
        sessions.iter().find(|s| s.id == session_id).cloned()
    }

    /// Returns all sessions sorted by last activity, most recent first.
    pub async fn sorted_sessions(&self) -> Vec<ChatSession> {
        let sessions = self.sessions.read().await;
        let mut sorted: Vec<ChatSession> = sessions.clone();
        sorted.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        sorted
    }

    /// Deletes a session.
    ///
    /// If the deleted session was active, the first remaining session (by
    /// creation order) becomes active, or the marker is cleared when none
    /// remain.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let next_active = {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|s| s.id != session_id);
            if sessions.len() == before {
                return Err(StrandError::not_found("session", session_id));
            }
            sessions.first().map(|s| s.id.clone())
        };

        self.repository.delete(session_id).await?;

        let was_active = {
            let active = self.active_id.read().await;
            active.as_deref() == Some(session_id)
        };
        if was_active {
            *self.active_id.write().await = next_active.clone();
            match &next_active {
                Some(id) => self.repository.set_active_session_id(id).await?,
                None => self.repository.clear_active_session_id().await?,
            }
        }

        tracing::info!("[SessionStore] Deleted session {}", session_id);
        Ok(())
    }

    /// Removes all messages from a session.
    pub async fn clear_messages(&self, session_id: &str) -> Result<()> {
        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| StrandError::not_found("session", session_id))?;
            session.messages.clear();
            session.clone()
        };
        self.repository.save(&snapshot).await
    }

    /// Appends a user message, deriving the session title from the first
    /// user message.
    pub async fn add_user_message(&self, session_id: &str, content: &str) -> Result<String> {
        self.create_message(session_id, MessageRole::User, content, MessageFlags::default())
            .await
    }

    /// Picks the identifier prefix for a freshly created message.
    fn id_prefix(role: MessageRole, flags: MessageFlags) -> &'static str {
        if flags.is_error {
            "error"
        } else if flags.is_step {
            "step"
        } else if role == MessageRole::User {
            "msg"
        } else {
            "content"
        }
    }
}

#[async_trait]
impl MessageSink for SessionStore {
    async fn create_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        flags: MessageFlags,
    ) -> Result<String> {
        let message = Message::new(Self::id_prefix(role, flags), role, content, flags);
        let message_id = message.id.clone();

        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| StrandError::not_found("session", session_id))?;

            session.last_message_time = message.timestamp.clone();
            session.messages.push(message);

            // The first user message names the session.
            if role == MessageRole::User && session.user_message_count() == 1 {
                session.title = derive_title(content);
            }

            session.clone()
        };

        self.repository.save(&snapshot).await?;
        Ok(message_id)
    }

    async fn append_content(&self, session_id: &str, message_id: &str, text: &str) -> Result<()> {
        let snapshot = {
            let mut sessions = self.sessions.write().await;
            let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) else {
                // Session vanished mid-stream (deleted by the user); drop the append.
                tracing::debug!(
                    "[SessionStore] Append to missing session {} dropped",
                    session_id
                );
                return Ok(());
            };
            let Some(message) = session.messages.iter_mut().find(|m| m.id == message_id) else {
                tracing::debug!(
                    "[SessionStore] Append to missing message {} dropped",
                    message_id
                );
                return Ok(());
            };

            if !message.content.is_empty() && !message.content.ends_with(' ') {
                message.content.push(' ');
            }
            message.content.push_str(text);
            message.timestamp = chrono::Utc::now().to_rfc3339();
            session.last_message_time = message.timestamp.clone();
            session.clone()
        };

        self.repository.save(&snapshot).await
    }
}
