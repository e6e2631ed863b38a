//! Chat session domain: models, repository contract, and the session store.

pub mod message;
pub mod model;
pub mod repository;
pub mod store;

pub use message::{Message, MessageFlags, MessageRole, generate_message_id};
pub use model::ChatSession;
pub use repository::SessionRepository;
pub use store::SessionStore;
