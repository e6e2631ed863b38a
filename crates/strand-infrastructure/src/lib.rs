//! Storage layer of the Strand client.

pub mod json_session_repository;
pub mod paths;

pub use json_session_repository::JsonSessionRepository;
pub use paths::StrandPaths;
