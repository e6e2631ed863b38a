//! Default agent profile presets.
//!
//! Provides the built-in assistant personas available without any
//! configuration.

use super::model::{AgentProfile, ApiContract};

/// Returns the built-in agent profiles.
///
/// - **Super Agent**: general-purpose multi-step agent on the
///   advanced-agent contract
/// - **Travel Assistant**: travel-planning persona on the plain chat
///   contract
pub fn default_profiles() -> Vec<AgentProfile> {
    vec![
        AgentProfile {
            id: "super-agent".to_string(),
            name: "Super Agent".to_string(),
            description: "General-purpose intelligent assistant that can answer various questions and provide professional advice in multiple domains.".to_string(),
            avatar: "/images/avatar-super.png".to_string(),
            api: ApiContract::AdvancedAgent,
            system_prompt: "You are a helpful, harmless, and honest AI assistant.".to_string(),
        },
        AgentProfile {
            id: "travel-agent".to_string(),
            name: "Travel Assistant".to_string(),
            description: "Specializes in travel-related questions, providing recommendations for tourist attractions, itinerary planning, transportation advice, and accommodation suggestions.".to_string(),
            avatar: "/images/avatar-travel.png".to_string(),
            api: ApiContract::Chat,
            system_prompt: "You are a travel assistant AI. Help users plan their trips, recommend destinations, accommodations, and activities. Give detailed travel advice based on user preferences.".to_string(),
        },
    ]
}
