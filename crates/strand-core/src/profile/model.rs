//! Agent profile domain model.
//!
//! Represents assistant personas the user can chat with. Each profile is
//! static configuration: it selects a backend API contract and carries the
//! default system prompt sent with every request.

use serde::{Deserialize, Serialize};

/// Which backend contract a profile talks to.
///
/// The contract determines both the endpoint used for streaming requests
/// and the accumulation policy applied to the response: the advanced-agent
/// contract renders one message per stream unit, the chat contract renders
/// a single growing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiContract {
    /// Multi-step agent endpoint; responses render as new-bubble messages.
    #[serde(rename = "advanced-agent")]
    AdvancedAgent,
    /// Plain chat endpoint; responses render as one combined message.
    #[serde(rename = "chat")]
    Chat,
}

/// An assistant persona with a fixed backend contract.
///
/// Profiles are static configuration and are not mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Unique profile identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description shown in profile pickers
    pub description: String,
    /// Avatar image reference
    pub avatar: String,
    /// Backend contract selection
    pub api: ApiContract,
    /// Default system prompt sent with every request
    pub system_prompt: String,
}
