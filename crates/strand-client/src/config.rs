//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strand_core::{Result, StrandError};

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Configuration for [`crate::ApiClient`].
///
/// Loaded from `config.toml` under the platform config directory; every
/// field is optional and falls back to its default. The timeout applies to
/// single-shot requests and connection setup only; an open stream is never
/// timed out by this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the assistant backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds for non-streaming calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StrandError::config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config = toml::from_str(&text)?;
        Ok(config)
    }

    /// Loads configuration from the default location, falling back to
    /// defaults when no config file exists.
    pub fn load_or_default() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => match Self::load(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("[ClientConfig] Ignoring invalid config file: {}", e);
                    Self::default()
                }
            },
            _ => Self::default(),
        }
    }

    /// Returns the default config file path (`<config dir>/strand/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("strand").join("config.toml"))
    }
}
