//! Conversation service: persists turns around the orchestrator

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use concierge_provider::Provider;
use concierge_session::{Conversation, ConversationStore, Message, Role, SessionError};

use crate::orchestrator::{Orchestrator, TurnOptions};
use crate::{AgentError, Result};

/// The two messages a successful turn adds to a conversation
#[derive(Debug, Clone)]
pub struct TurnMessages {
    pub user: Message,
    pub assistant: Message,
    pub tool_transcript: Option<String>,
}

pub struct ConversationService<P: Provider> {
    orchestrator: Orchestrator<P>,
    store: Arc<Mutex<ConversationStore>>,
}

impl<P: Provider> ConversationService<P> {
    pub fn new(orchestrator: Orchestrator<P>, store: ConversationStore) -> Self {
        Self {
            orchestrator,
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<P> {
        &self.orchestrator
    }

    pub fn store(&self) -> Arc<Mutex<ConversationStore>> {
        Arc::clone(&self.store)
    }

    /// Create a conversation, optionally running a first turn.
    ///
    /// If that first turn fails the conversation is deleted again.
    pub async fn start(
        &self,
        title: Option<String>,
        session_id: Option<String>,
        initial_message: Option<&str>,
        opts: TurnOptions,
    ) -> Result<(Conversation, Option<TurnMessages>)> {
        let conversation = self.store.lock().await.create(title, session_id).await?;
        info!("started conversation {}", conversation.id);

        let Some(content) = initial_message.filter(|m| !m.trim().is_empty()) else {
            return Ok((conversation, None));
        };

        match self.send(conversation.id, content, opts).await {
            Ok(turn) => {
                let conversation = self
                    .store
                    .lock()
                    .await
                    .get(conversation.id)
                    .await?
                    .ok_or(AgentError::ConversationNotFound(conversation.id))?;
                Ok((conversation, Some(turn)))
            }
            Err(e) => {
                if let Err(cleanup) = self.store.lock().await.delete(conversation.id).await {
                    error!("failed to discard conversation {}: {}", conversation.id, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Append a user message, run a turn over the full history and append
    /// the reply. A failed turn leaves the conversation as it was.
    pub async fn send(
        &self,
        conversation_id: Uuid,
        content: &str,
        opts: TurnOptions,
    ) -> Result<TurnMessages> {
        let (user, history) = {
            let mut store = self.store.lock().await;
            let user = store
                .append_message(conversation_id, Role::User, content)
                .await
                .map_err(|e| match e {
                    SessionError::NotFound(id) => AgentError::ConversationNotFound(id),
                    other => AgentError::Store(other),
                })?;
            let history = store.history(conversation_id).await?;
            (user, history)
        };
        debug!(
            "conversation {}: running turn over {} message(s)",
            conversation_id,
            history.len()
        );

        let report = match self.orchestrator.run_turn_detailed(&history, opts).await {
            Ok(report) => report,
            Err(e) => {
                error!("turn failed for conversation {}: {}", conversation_id, e);
                let mut store = self.store.lock().await;
                if let Err(rollback) = store.remove_message(conversation_id, user.id).await {
                    error!("failed to roll back user message {}: {}", user.id, rollback);
                }
                return Err(e);
            }
        };

        let assistant = self
            .store
            .lock()
            .await
            .append_message(conversation_id, Role::Assistant, report.answer)
            .await?;

        Ok(TurnMessages {
            user,
            assistant,
            tool_transcript: report.tool_transcript,
        })
    }
}
