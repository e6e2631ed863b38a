//! HTTP layer of the Strand client.
//!
//! Wraps the assistant backend's endpoints behind [`ApiClient`] and adapts
//! chunked response bodies to the core transport contract via
//! [`HttpTransport`].

pub mod client;
pub mod config;
pub mod transport;

pub use client::{AdvancedTaskRequest, ApiClient};
pub use config::ClientConfig;
pub use transport::HttpTransport;
