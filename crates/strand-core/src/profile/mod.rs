//! Agent profile domain.
//!
//! Profiles describe the assistant personas a session can talk to and which
//! backend API contract each one uses.

pub mod model;
pub mod preset;
pub mod registry;

pub use model::{AgentProfile, ApiContract};
pub use preset::default_profiles;
pub use registry::ProfileRegistry;
