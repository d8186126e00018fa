//! Concierge - booking assistant for the terminal

use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    chat_command, conversations_delete_command, conversations_list_command,
    conversations_show_command, init_command, prompt_command, status_command, tools_command,
};

/// Concierge - booking assistant for your terminal
#[derive(Parser)]
#[command(name = "concierge")]
#[command(about = "◆ Booking assistant with tool calling and knowledge retrieval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and data directories
    Init,
    /// Chat with the assistant
    Chat(ChatArgs),
    /// Manage stored conversations
    Conversations {
        #[command(subcommand)]
        command: ConversationCommands,
    },
    /// Print a system prompt variant
    Prompt {
        /// default, minimal or detailed
        variant: Option<String>,
    },
    /// List the booking tools offered to the model
    Tools,
    /// Show configuration status
    Status,
}

#[derive(Args)]
pub struct ChatArgs {
    /// Send one message and exit
    #[arg(short, long)]
    pub message: Option<String>,
    /// Continue an existing conversation
    #[arg(short, long)]
    pub conversation: Option<String>,
    /// Title for a new conversation
    #[arg(long)]
    pub title: Option<String>,
    /// Session to group the conversation under
    #[arg(long)]
    pub session: Option<String>,
    /// Do not offer booking tools to the model
    #[arg(long)]
    pub no_tools: bool,
    /// Augment questions with retrieved business information
    #[arg(long)]
    pub rag: bool,
}

#[derive(Subcommand)]
enum ConversationCommands {
    /// List conversations, newest first
    List {
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Print a conversation's messages
    Show { id: String },
    /// Delete a conversation
    Delete { id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Chat(args) => chat_command(args).await,
        Commands::Conversations { command } => match command {
            ConversationCommands::List { session } => conversations_list_command(session).await,
            ConversationCommands::Show { id } => conversations_show_command(&id).await,
            ConversationCommands::Delete { id } => conversations_delete_command(&id).await,
        },
        Commands::Prompt { variant } => prompt_command(variant),
        Commands::Tools => tools_command(),
        Commands::Status => status_command().await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
