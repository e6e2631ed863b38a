//! Chat use case implementation.
//!
//! `ChatUseCase` coordinates the session store, the API client, and the
//! stream orchestrator. It owns the user-facing operations: creating and
//! switching chats, sending a message over the streaming contracts, and
//! the single-shot fallback path.

use crate::stream::{StreamOrchestrator, StreamOutcome};
use std::sync::Arc;
use strand_client::{AdvancedTaskRequest, ApiClient};
use strand_core::ingest::{AccumulationPolicy, MessageSink, extract_content};
use strand_core::profile::{AgentProfile, ApiContract, ProfileRegistry};
use strand_core::session::{ChatSession, MessageFlags, MessageRole, SessionStore};
use strand_core::{Result, StrandError};
use tokio::sync::RwLock;

/// User-facing chat operations.
///
/// All collaborators are shared (`Arc`); the registry of agent profiles is
/// the only piece of mutable state owned here.
pub struct ChatUseCase {
    /// Session list and message mutations
    store: Arc<SessionStore>,
    /// Backend endpoints
    client: Arc<ApiClient>,
    /// Per-session stream lifecycle
    orchestrator: Arc<StreamOrchestrator>,
    /// Available agent profiles and the current selection
    profiles: RwLock<ProfileRegistry>,
}

impl ChatUseCase {
    /// Creates a use case over the given collaborators.
    pub fn new(store: Arc<SessionStore>, client: Arc<ApiClient>, profiles: ProfileRegistry) -> Self {
        Self {
            store,
            client,
            orchestrator: Arc::new(StreamOrchestrator::new()),
            profiles: RwLock::new(profiles),
        }
    }

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Creates a new chat bound to `agent_id`, or to the currently selected
    /// agent when `None`, and makes it active.
    pub async fn create_chat(&self, agent_id: Option<&str>) -> Result<ChatSession> {
        let agent_id = {
            let profiles = self.profiles.read().await;
            match agent_id {
                Some(id) => profiles
                    .get(id)
                    .map(|p| p.id.clone())
                    .ok_or_else(|| StrandError::not_found("agent profile", id))?,
                None => profiles.selected_profile().id.clone(),
            }
        };
        self.store.create_session(&agent_id).await
    }

    /// Switches the active chat, closing the previous chat's live stream
    /// first.
    pub async fn select_chat(&self, session_id: &str) -> Result<()> {
        if let Some(previous) = self.store.active_session_id().await {
            if previous != session_id {
                self.stop_streaming(&previous).await;
            }
        }
        self.store.select_session(session_id).await
    }

    /// Deletes a chat, cancelling its live stream if one is open.
    pub async fn delete_chat(&self, session_id: &str) -> Result<()> {
        self.stop_streaming(session_id).await;
        self.store.delete_session(session_id).await
    }

    /// Removes all messages from the active chat.
    pub async fn clear_messages(&self) -> Result<()> {
        let session_id = self.require_active_session_id().await?;
        self.store.clear_messages(&session_id).await
    }

    /// Returns all chats, most recently active first.
    pub async fn history(&self) -> Vec<ChatSession> {
        self.store.sorted_sessions().await
    }

    /// Returns the active chat, if any.
    pub async fn active_chat(&self) -> Option<ChatSession> {
        self.store.active_session().await
    }

    // ========================================================================
    // Agent profiles
    // ========================================================================

    /// Selects the agent profile used for new chats.
    pub async fn set_selected_agent(&self, agent_id: &str) -> Result<()> {
        self.profiles.write().await.select(agent_id)
    }

    /// Returns the available agent profiles.
    pub async fn agent_profiles(&self) -> Vec<AgentProfile> {
        self.profiles.read().await.all().to_vec()
    }

    /// Probes the backend status endpoint.
    pub async fn backend_status(&self) -> Result<serde_json::Value> {
        self.client.status().await
    }

    // ========================================================================
    // Sending messages
    // ========================================================================

    /// Sends a message on the active chat over the streaming contract of
    /// its agent profile.
    ///
    /// The user message is appended first (deriving the title on the first
    /// one). Advanced-agent chats stream under the new-bubble policy and
    /// fall back to the single-shot path when the request itself is
    /// rejected; plain chats stream under the combined policy and surface
    /// failures as one error message.
    ///
    /// # Errors
    ///
    /// Returns an error for empty input, when no chat is active, or when
    /// the session store fails. Transport failures do not error; they end
    /// up as error-flagged chat messages.
    pub async fn send_message(&self, text: &str) -> Result<StreamOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StrandError::invalid_input("Message is empty"));
        }
        let session = self
            .store
            .active_session()
            .await
            .ok_or_else(|| StrandError::invalid_input("No chat selected; create one first"))?;

        self.store.add_user_message(&session.id, text).await?;

        let profile = self.profile_for(&session).await;
        tracing::info!(
            "[ChatUseCase] Sending on {} via {:?} contract",
            session.id,
            profile.api
        );

        match profile.api {
            ApiContract::AdvancedAgent => {
                let request = AdvancedTaskRequest::new(text, &session.id, &profile.system_prompt);
                match self.client.post_advanced_stream(&request).await {
                    Ok(transport) => {
                        let outcome = self
                            .orchestrator
                            .run(
                                &session.id,
                                Box::new(transport),
                                AccumulationPolicy::NewBubble,
                                self.store.as_ref(),
                            )
                            .await?;
                        if outcome == StreamOutcome::FailedStatus {
                            // The backend rejected the stream; try the
                            // single-shot path once.
                            self.fallback_to_sync(text, &session.id, &profile).await?;
                        }
                        Ok(outcome)
                    }
                    Err(err) => {
                        self.append_error(&session.id, &err).await?;
                        self.fallback_to_sync(text, &session.id, &profile).await?;
                        Ok(StreamOutcome::FailedStatus)
                    }
                }
            }
            ApiContract::Chat => {
                match self
                    .client
                    .get_chat_stream(text, &session.id, &profile.system_prompt)
                    .await
                {
                    Ok(transport) => {
                        self.orchestrator
                            .run(
                                &session.id,
                                Box::new(transport),
                                AccumulationPolicy::Combined,
                                self.store.as_ref(),
                            )
                            .await
                    }
                    Err(err) => {
                        self.append_error(&session.id, &err).await?;
                        Ok(StreamOutcome::FailedStatus)
                    }
                }
            }
        }
    }

    /// Sends a message on the active chat over the single-shot endpoints.
    pub async fn send_message_sync(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StrandError::invalid_input("Message is empty"));
        }
        let session = self
            .store
            .active_session()
            .await
            .ok_or_else(|| StrandError::invalid_input("No chat selected; create one first"))?;

        self.store.add_user_message(&session.id, text).await?;
        let profile = self.profile_for(&session).await;
        self.fallback_to_sync(text, &session.id, &profile).await
    }

    /// Cancels the session's live stream and asks the backend to release
    /// it. The backend call is best effort.
    pub async fn stop_streaming(&self, session_id: &str) {
        if self.orchestrator.cancel(session_id).await {
            if let Err(err) = self.client.close_stream(session_id).await {
                tracing::debug!("[ChatUseCase] Backend stream close failed: {}", err);
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Resolves the profile a session talks to, falling back to the
    /// currently selected profile when the session references an unknown
    /// agent.
    async fn profile_for(&self, session: &ChatSession) -> AgentProfile {
        let profiles = self.profiles.read().await;
        profiles
            .get(&session.agent_id)
            .unwrap_or_else(|| profiles.selected_profile())
            .clone()
    }

    /// Runs the single-shot request matching the profile's contract and
    /// appends the extracted content as one assistant message. A failure
    /// becomes one error-flagged message instead of an error.
    async fn fallback_to_sync(
        &self,
        text: &str,
        session_id: &str,
        profile: &AgentProfile,
    ) -> Result<()> {
        tracing::info!("[ChatUseCase] Single-shot fallback for {}", session_id);

        let response = match profile.api {
            ApiContract::AdvancedAgent => {
                let request = AdvancedTaskRequest::new(text, session_id, &profile.system_prompt);
                self.client.execute_advanced_task(&request).await
            }
            ApiContract::Chat => self.client.chat(text, session_id).await,
        };

        match response {
            Ok(value) => {
                let content = extract_content(&value).unwrap_or_else(|| value.to_string());
                self.store
                    .create_message(
                        session_id,
                        MessageRole::Assistant,
                        &content,
                        MessageFlags::default(),
                    )
                    .await?;
                Ok(())
            }
            Err(err) => self.append_error(session_id, &err).await,
        }
    }

    async fn append_error(&self, session_id: &str, err: &StrandError) -> Result<()> {
        tracing::warn!("[ChatUseCase] Request failed for {}: {}", session_id, err);
        self.store
            .create_message(
                session_id,
                MessageRole::Assistant,
                &format!("Request failed: {err}"),
                MessageFlags::error(),
            )
            .await?;
        Ok(())
    }

    async fn require_active_session_id(&self) -> Result<String> {
        self.store
            .active_session_id()
            .await
            .ok_or_else(|| StrandError::invalid_input("No chat selected; create one first"))
    }
}
