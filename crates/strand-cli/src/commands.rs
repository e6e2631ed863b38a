//! Command implementations for the Strand CLI.

use anyhow::Result;
use std::sync::Arc;
use strand_application::ChatUseCase;
use strand_client::{ApiClient, ClientConfig};
use strand_core::profile::ProfileRegistry;
use strand_core::session::{Message, MessageRole, SessionStore};
use strand_infrastructure::JsonSessionRepository;

/// Wires repository, store, client, and profiles into a use case.
pub async fn build_usecase() -> Result<ChatUseCase> {
    let repository = Arc::new(JsonSessionRepository::default_location().await?);
    let store = Arc::new(SessionStore::load(repository).await?);
    let config = ClientConfig::load_or_default();
    let client = Arc::new(ApiClient::new(&config)?);
    Ok(ChatUseCase::new(store, client, ProfileRegistry::default()))
}

pub async fn new_chat(usecase: &ChatUseCase, agent: Option<&str>) -> Result<()> {
    let session = usecase.create_chat(agent).await?;
    println!("Created chat {} ({})", session.id, session.agent_id);
    Ok(())
}

pub async fn list_chats(usecase: &ChatUseCase) {
    let history = usecase.history().await;
    if history.is_empty() {
        println!("No chats yet. Create one with `strand new`.");
        return;
    }
    let active = usecase
        .active_chat()
        .await
        .map(|s| s.id)
        .unwrap_or_default();
    for session in history {
        let marker = if session.id == active { "*" } else { " " };
        println!(
            "{} {}  {}  [{}]  {} message(s)",
            marker,
            session.id,
            session.title,
            session.agent_id,
            session.messages.len()
        );
    }
}

pub async fn show_chat(usecase: &ChatUseCase) -> Result<()> {
    let session = match usecase.active_chat().await {
        Some(session) => session,
        None => {
            println!("No active chat.");
            return Ok(());
        }
    };
    println!("{}  {}", session.id, session.title);
    for message in &session.messages {
        print_message(message);
    }
    Ok(())
}

pub async fn select_chat(usecase: &ChatUseCase, chat_id: &str) -> Result<()> {
    usecase.select_chat(chat_id).await?;
    println!("Selected {}", chat_id);
    Ok(())
}

pub async fn send(usecase: &ChatUseCase, message: &str, sync: bool) -> Result<()> {
    let before = usecase
        .active_chat()
        .await
        .map(|s| s.messages.len())
        .unwrap_or(0);

    if sync {
        usecase.send_message_sync(message).await?;
    } else {
        usecase.send_message(message).await?;
    }

    // Print everything the exchange appended, response included.
    if let Some(session) = usecase.active_chat().await {
        for message in session.messages.iter().skip(before) {
            print_message(message);
        }
    }
    Ok(())
}

pub async fn delete_chat(usecase: &ChatUseCase, chat_id: &str) -> Result<()> {
    usecase.delete_chat(chat_id).await?;
    println!("Deleted {}", chat_id);
    Ok(())
}

pub async fn clear_messages(usecase: &ChatUseCase) -> Result<()> {
    usecase.clear_messages().await?;
    println!("Cleared.");
    Ok(())
}

pub async fn list_agents(usecase: &ChatUseCase) {
    for profile in usecase.agent_profiles().await {
        println!("{}  ({:?})", profile.id, profile.api);
        println!("    {}", profile.description);
    }
}

pub async fn backend_status(usecase: &ChatUseCase) -> Result<()> {
    let status = usecase.backend_status().await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn print_message(message: &Message) {
    let who = match message.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "assistant",
    };
    let tag = if message.is_error {
        " [error]"
    } else if message.is_step {
        " [step]"
    } else {
        ""
    };
    println!("{}{}: {}", who, tag, message.content);
}
