//! Profile registry with a selected profile.

use super::model::AgentProfile;
use super::preset::default_profiles;
use crate::error::{Result, StrandError};

/// Holds the available agent profiles and the current selection.
///
/// The selection always resolves to a profile: if the selected identifier
/// disappears from the registry the first profile acts as the fallback.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<AgentProfile>,
    selected: String,
}

impl ProfileRegistry {
    /// Creates a registry over the given profiles, selecting the first one.
    ///
    /// # Errors
    ///
    /// Returns an error if `profiles` is empty.
    pub fn new(profiles: Vec<AgentProfile>) -> Result<Self> {
        let selected = profiles
            .first()
            .map(|p| p.id.clone())
            .ok_or_else(|| StrandError::config("Profile registry requires at least one profile"))?;
        Ok(Self { profiles, selected })
    }

    /// Selects a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns [`StrandError::NotFound`] for an unknown profile.
    pub fn select(&mut self, profile_id: &str) -> Result<()> {
        if !self.profiles.iter().any(|p| p.id == profile_id) {
            return Err(StrandError::not_found("agent profile", profile_id));
        }
        self.selected = profile_id.to_string();
        Ok(())
    }

    /// Returns the currently selected profile.
    pub fn selected_profile(&self) -> &AgentProfile {
        self.profiles
            .iter()
            .find(|p| p.id == self.selected)
            .unwrap_or(&self.profiles[0])
    }

    /// Looks up a profile by ID.
    pub fn get(&self, profile_id: &str) -> Option<&AgentProfile> {
        self.profiles.iter().find(|p| p.id == profile_id)
    }

    /// Returns all registered profiles.
    pub fn all(&self) -> &[AgentProfile] {
        &self.profiles
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        // default_profiles() is never empty
        Self::new(default_profiles()).expect("preset profiles exist")
    }
}
