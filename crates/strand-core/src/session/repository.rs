//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use super::model::ChatSession;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing session persistence.
///
/// This trait defines the contract for persisting and retrieving sessions,
/// decoupling the session store from the specific storage mechanism
/// (e.g., JSON files, database, remote API).
///
/// Two keys are persisted: the per-session documents and the active session
/// identifier. The session store saves after every mutation, so
/// implementations must make `save` durable before returning.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ChatSession))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<ChatSession>>;

    /// Saves a session to storage.
    async fn save(&self, session: &ChatSession) -> Result<()>;

    /// Deletes a session from storage.
    ///
    /// Deleting a session that does not exist is not an error.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists all stored sessions, most recently active first.
    async fn list_all(&self) -> Result<Vec<ChatSession>>;

    /// Gets the ID of the currently active session.
    async fn get_active_session_id(&self) -> Result<Option<String>>;

    /// Sets the ID of the currently active session.
    async fn set_active_session_id(&self, session_id: &str) -> Result<()>;

    /// Clears the active session marker.
    async fn clear_active_session_id(&self) -> Result<()>;
}
