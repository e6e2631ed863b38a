//! Application layer of the Strand client.
//!
//! Ties the HTTP client, the ingestion engine, and the session store
//! together: [`StreamOrchestrator`] drives one streaming call end to end,
//! [`ChatUseCase`] exposes the user-facing operations.

pub mod chat_usecase;
pub mod stream;

pub use chat_usecase::ChatUseCase;
pub use stream::{StreamOrchestrator, StreamOutcome};
