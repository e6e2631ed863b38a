use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "strand")]
#[command(about = "Strand CLI - streaming chat client for agent backends", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new chat and make it active
    New {
        /// Agent profile to bind the chat to (defaults to the selected one)
        #[arg(long)]
        agent: Option<String>,
    },
    /// List chats, most recently active first
    List,
    /// Show the active chat's messages
    Show,
    /// Make a chat active
    Select { chat_id: String },
    /// Send a message on the active chat and print the response
    Send {
        message: String,
        /// Use the single-shot endpoints instead of streaming
        #[arg(long)]
        sync: bool,
    },
    /// Delete a chat
    Delete { chat_id: String },
    /// Remove all messages from the active chat
    Clear,
    /// List the available agent profiles
    Agents,
    /// Probe the backend status endpoint
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let usecase = commands::build_usecase().await?;

    match cli.command {
        Commands::New { agent } => commands::new_chat(&usecase, agent.as_deref()).await?,
        Commands::List => commands::list_chats(&usecase).await,
        Commands::Show => commands::show_chat(&usecase).await?,
        Commands::Select { chat_id } => commands::select_chat(&usecase, &chat_id).await?,
        Commands::Send { message, sync } => commands::send(&usecase, &message, sync).await?,
        Commands::Delete { chat_id } => commands::delete_chat(&usecase, &chat_id).await?,
        Commands::Clear => commands::clear_messages(&usecase).await?,
        Commands::Agents => commands::list_agents(&usecase).await,
        Commands::Status => commands::backend_status(&usecase).await?,
    }

    Ok(())
}
