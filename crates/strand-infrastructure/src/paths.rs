//! Filesystem path resolution.

use std::path::PathBuf;
use strand_core::{Result, StrandError};

/// Resolves the application's data directories.
pub struct StrandPaths;

impl StrandPaths {
    /// Returns the configuration/data directory (`<config dir>/strand`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be
    /// determined.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("strand"))
            .ok_or_else(|| StrandError::config("Failed to determine config directory"))
    }
}
