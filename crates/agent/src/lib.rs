//! Booking assistant core
//!
//! Turns a conversation history into one assistant reply. A turn may pull
//! background text from the retrieval gateway, let the model call the
//! booking tools once, and then asks the model for a final answer.

use thiserror::Error;
use uuid::Uuid;

pub mod context;
pub mod conversation;
pub mod orchestrator;
pub mod prompts;
pub mod tools;

pub use context::PromptComposer;
pub use conversation::{ConversationService, TurnMessages};
pub use orchestrator::{Orchestrator, TurnOptions, TurnReport};
pub use prompts::SystemPrompt;
pub use tools::{BookingStore, ToolCatalog, ToolError, ToolKind, ToolOutput, ToolResult};

/// Errors that abort a turn
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("model call failed: {0}")]
    UpstreamModel(#[from] concierge_provider::ProviderError),

    #[error("conversation store error: {0}")]
    Store(#[from] concierge_session::SessionError),

    #[error("conversation {0} not found")]
    ConversationNotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, AgentError>;
