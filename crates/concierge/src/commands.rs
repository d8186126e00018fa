//! Concierge command implementations

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use concierge_agent::{
    BookingStore, ConversationService, Orchestrator, PromptComposer, SystemPrompt, ToolCatalog,
    TurnMessages, TurnOptions,
};
use concierge_config::{self, Config};
use concierge_provider::OpenAiProvider;
use concierge_retrieval::{OpenAiEmbedder, PineconeIndex, RetrievalGateway};
use concierge_session::{ConversationStore, Role};

use crate::ChatArgs;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Write default config and create the data directories
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing Concierge...");

    let config = concierge_config::init()
        .await
        .context("failed to initialize config")?;

    println!("✓ Config: {}", concierge_config::config_path().display());
    println!("✓ Conversations: {}", config.conversations_dir().display());
    println!("\nSet OPENAI_API_KEY (and PINECONE_API_KEY for retrieval) or edit the config file.");
    Ok(())
}

/// Build the retrieval gateway from config; anything missing disables it.
async fn build_retrieval(config: &Config) -> RetrievalGateway {
    if !config.retrieval_configured() {
        debug!("retrieval not configured");
        return RetrievalGateway::disabled();
    }

    let retrieval = &config.retrieval;
    let index = match retrieval.index_host.as_deref().filter(|h| !h.is_empty()) {
        Some(host) => PineconeIndex::new(retrieval.api_key.clone(), host),
        None => match PineconeIndex::resolve(retrieval.api_key.clone(), &retrieval.index_name, None)
            .await
        {
            Ok(index) => index,
            Err(e) => {
                warn!("retrieval unavailable: {}", e);
                return RetrievalGateway::disabled();
            }
        },
    };
    info!("retrieval index at {}", index.host());

    let embedder = OpenAiEmbedder::new(
        config.model.api_key.clone(),
        config.model.api_base.clone(),
        retrieval.embedding_model.clone(),
        retrieval.embedding_dimensions,
    );

    RetrievalGateway::new(Arc::new(embedder), Arc::new(index)).with_top_k(retrieval.top_k)
}

async fn build_service(config: &Config) -> Result<ConversationService<OpenAiProvider>> {
    if !config.has_api_key() {
        bail!(
            "no model API key configured; set OPENAI_API_KEY or edit {}",
            concierge_config::config_path().display()
        );
    }

    let provider = OpenAiProvider::with_timeout(
        config.model.api_key.clone(),
        config.model.api_base.clone(),
        Some(config.model.model.clone()),
        Duration::from_secs(config.model.timeout_secs),
    );

    let bookings = BookingStore::new();
    if config.assistant.seed_sample_booking {
        let sample = bookings.seed_sample();
        debug!("seeded sample booking {}", sample.booking_id);
    }

    let orchestrator = Orchestrator::new(
        provider,
        PromptComposer::new(SystemPrompt::from_name(&config.assistant.prompt_variant)),
        ToolCatalog::new(bookings),
        build_retrieval(config).await,
    )
    .with_model(config.model.model.clone())
    .with_sampling(config.model.max_tokens, config.model.temperature)
    .with_max_context_length(config.retrieval.max_context_length);

    Ok(ConversationService::new(
        orchestrator,
        ConversationStore::new(config.conversations_dir()),
    ))
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("invalid conversation id '{}'", id))
}

fn print_turn(turn: &TurnMessages, verbose_tools: bool) {
    if verbose_tools {
        if let Some(transcript) = &turn.tool_transcript {
            println!("\n{}", transcript);
        }
    }
    println!("\n◆ {}\n", turn.assistant.content);
}

/// One-shot or interactive chat
pub async fn chat_command(args: ChatArgs) -> Result<()> {
    if args.message.as_deref().is_some_and(|m| m.trim().is_empty()) {
        bail!("message is empty");
    }

    let config = Config::load().await?;
    let service = build_service(&config).await?;

    let opts = TurnOptions {
        use_tools: config.assistant.use_tools && !args.no_tools,
        use_rag: config.assistant.use_rag || args.rag,
    };
    debug!("turn options: {:?}", opts);
    let show_tools = tracing::enabled!(tracing::Level::DEBUG);

    let conversation_id = match &args.conversation {
        Some(id) => {
            let id = parse_id(id)?;
            if service.store().lock().await.get(id).await?.is_none() {
                bail!("conversation {} not found", id);
            }
            Some(id)
        }
        None => None,
    };

    if let Some(message) = args.message {
        let message = message.trim();
        let turn = match conversation_id {
            Some(id) => service.send(id, message, opts).await?,
            None => {
                let (conversation, turn) = service
                    .start(args.title, args.session, Some(message), opts)
                    .await?;
                println!("◆ Conversation {}", conversation.id);
                turn.context("no reply for the first message")?
            }
        };
        print_turn(&turn, show_tools);
        return Ok(());
    }

    let id = match conversation_id {
        Some(id) => id,
        None => {
            let (conversation, _) = service.start(args.title, args.session, None, opts).await?;
            conversation.id
        }
    };

    println!("◆ Conversation {} (type 'exit' to quit)", id);
    println!("{}", RULE);

    loop {
        print!("◆ ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        match service.send(id, input, opts).await {
            Ok(turn) => print_turn(&turn, show_tools),
            Err(e) => println!("\n✗ {}\n", e),
        }
    }

    Ok(())
}

pub async fn conversations_list_command(session: Option<String>) -> Result<()> {
    let config = Config::load().await?;
    let mut store = ConversationStore::new(config.conversations_dir());
    let conversations = store.list(session.as_deref()).await?;

    if conversations.is_empty() {
        println!("No conversations");
        return Ok(());
    }

    println!("Conversations:");
    for c in conversations {
        println!(
            "  {}  {} ({} messages, updated {})",
            c.id,
            c.title,
            c.messages.len(),
            c.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

pub async fn conversations_show_command(id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let config = Config::load().await?;
    let mut store = ConversationStore::new(config.conversations_dir());

    let conversation = store
        .get(id)
        .await?
        .with_context(|| format!("conversation {} not found", id))?;

    println!("◆ {}", conversation.title);
    println!("{}", RULE);
    println!("ID:      {}", conversation.id);
    if let Some(session) = &conversation.session_id {
        println!("Session: {}", session);
    }
    println!(
        "Created: {}",
        conversation.created_at.format("%Y-%m-%d %H:%M:%S")
    );

    for message in conversation.history() {
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "concierge",
            Role::System => "system",
            Role::Tool => "tool",
        };
        println!("\n[{}] {}", who, message.content);
    }
    Ok(())
}

pub async fn conversations_delete_command(id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let config = Config::load().await?;
    let mut store = ConversationStore::new(config.conversations_dir());

    if store.delete(id).await? {
        println!("✓ Conversation {} deleted", id);
    } else {
        println!("✗ Conversation {} not found", id);
    }
    Ok(())
}

pub fn prompt_command(variant: Option<String>) -> Result<()> {
    let prompt = match variant.as_deref() {
        Some(name) => name.parse::<SystemPrompt>().map_err(anyhow::Error::msg)?,
        None => SystemPrompt::Default,
    };

    println!("◆ System prompt: {}", prompt);
    println!("{}", RULE);
    println!("{}", prompt.text());

    let names: Vec<&str> = SystemPrompt::ALL.iter().map(|p| p.name()).collect();
    println!("\nVariants: {}", names.join(", "));
    Ok(())
}

pub fn tools_command() -> Result<()> {
    println!("◆ Booking tools");
    println!("{}", RULE);
    for tool in ToolCatalog::default().definitions() {
        let required = tool.function.parameters["required"]
            .as_array()
            .map(|r| {
                r.iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!("  {} - {}", tool.function.name, tool.function.description);
        if !required.is_empty() {
            println!("      required: {}", required);
        }
    }
    Ok(())
}

/// Show config location and which collaborators are configured
pub async fn status_command() -> Result<()> {
    let config_path = concierge_config::config_path();

    println!("◆ Concierge Status");
    println!("{}", RULE);

    println!(
        "Config:        {} {}",
        config_path.display(),
        if config_path.exists() { "[OK]" } else { "[Missing]" }
    );

    let config = Config::load().await?;
    let conversations = config.conversations_dir();
    println!(
        "Conversations: {} {}",
        conversations.display(),
        if conversations.exists() { "[OK]" } else { "[Missing]" }
    );
    println!("Model:         {}", config.model.model);
    println!(
        "API Key:       {}",
        if config.has_api_key() { "[Set]" } else { "[Missing]" }
    );
    println!(
        "Retrieval:     {}",
        if config.retrieval_configured() {
            format!("[Configured] index {}", config.retrieval.index_name)
        } else {
            "[Not configured]".to_string()
        }
    );
    println!(
        "Prompt:        {}",
        SystemPrompt::from_name(&config.assistant.prompt_variant)
    );
    println!(
        "Defaults:      tools {}, rag {}",
        if config.assistant.use_tools { "on" } else { "off" },
        if config.assistant.use_rag { "on" } else { "off" }
    );

    println!("\n◆ Ready");
    Ok(())
}
