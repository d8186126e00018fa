//! Completion orchestrator
//!
//! One turn is at most two model calls:
//!
//! 1. the composed (optionally augmented) history, with the tool catalog
//!    attached when tools are enabled;
//! 2. only if call 1 requested tools: the history plus the tool results,
//!    with no tools attached.
//!
//! Tool calls requested by call 2 are dropped. There is no third round.

use std::sync::Arc;
use tracing::{debug, info, warn};

use concierge_provider::{ChatParams, ChatResponse, Message, Provider, Role, Tool, ToolChoice};
use concierge_retrieval::RetrievalGateway;
use concierge_session::Message as StoredMessage;

use crate::context::PromptComposer;
use crate::tools::{ToolCatalog, ToolResult};
use crate::Result;

/// Per-turn switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOptions {
    pub use_tools: bool,
    pub use_rag: bool,
}

impl Default for TurnOptions {
    fn default() -> Self {
        Self {
            use_tools: true,
            use_rag: false,
        }
    }
}

/// What a turn produced
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub answer: String,
    /// Assistant text from call 1 followed by the rendered tool results.
    /// Only set when tools ran.
    pub tool_transcript: Option<String>,
    pub model_calls: u8,
}

pub struct Orchestrator<P: Provider> {
    provider: Arc<P>,
    composer: PromptComposer,
    catalog: ToolCatalog,
    retrieval: RetrievalGateway,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_context_length: usize,
}

impl<P: Provider> Orchestrator<P> {
    pub fn new(
        provider: P,
        composer: PromptComposer,
        catalog: ToolCatalog,
        retrieval: RetrievalGateway,
    ) -> Self {
        let defaults = ChatParams::default();
        Self {
            provider: Arc::new(provider),
            composer,
            catalog,
            retrieval,
            model: String::new(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            max_context_length: RetrievalGateway::DEFAULT_MAX_LENGTH,
        }
    }

    /// Model name sent with each call; empty means the provider default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn with_max_context_length(mut self, max_length: usize) -> Self {
        self.max_context_length = max_length;
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    /// Run one turn and return the final answer text.
    pub async fn run_turn(&self, history: &[StoredMessage], opts: TurnOptions) -> Result<String> {
        Ok(self.run_turn_detailed(history, opts).await?.answer)
    }

    pub async fn run_turn_detailed(
        &self,
        history: &[StoredMessage],
        opts: TurnOptions,
    ) -> Result<TurnReport> {
        let augmentation = if opts.use_rag {
            self.augmentation_for(history).await
        } else {
            None
        };

        let messages = self.composer.compose(history, augmentation.as_deref());
        let tools = if opts.use_tools {
            self.catalog.definitions()
        } else {
            Vec::new()
        };

        let first = self.call(1, messages, tools).await?;

        if !opts.use_tools || !first.has_tool_calls() {
            return Ok(TurnReport {
                answer: first.content.unwrap_or_default(),
                tool_transcript: None,
                model_calls: 1,
            });
        }

        // Sequential, in the order the model emitted them.
        let results: Vec<ToolResult> = first
            .tool_calls
            .iter()
            .map(|call| {
                debug!("executing tool {} ({})", call.name, call.id);
                self.catalog.execute(call)
            })
            .collect();

        let transcript = combined_transcript(first.content.as_deref(), &results);
        debug!("provisional transcript:\n{}", transcript);

        let messages = self.composer.compose_with_tool_results(
            history,
            first.content.as_deref(),
            &first.tool_calls,
            &results,
        );
        let second = self.call(2, messages, Vec::new()).await?;

        if second.has_tool_calls() {
            warn!(
                "discarding {} tool call(s) requested after the tool round",
                second.tool_calls.len()
            );
        }

        Ok(TurnReport {
            answer: second.content.unwrap_or_default(),
            tool_transcript: Some(transcript),
            model_calls: 2,
        })
    }

    async fn augmentation_for(&self, history: &[StoredMessage]) -> Option<String> {
        let query = history.iter().rev().find(|m| m.role == Role::User)?;
        let context = self
            .retrieval
            .get_context(&query.content, self.max_context_length)
            .await;

        if context.is_empty() {
            debug!("no retrieved context for this turn");
            None
        } else {
            debug!(chars = context.chars().count(), "augmenting last user message");
            Some(context)
        }
    }

    async fn call(&self, n: u8, messages: Vec<Message>, tools: Vec<Tool>) -> Result<ChatResponse> {
        info!(
            call = n,
            messages = messages.len(),
            tools = !tools.is_empty(),
            "calling model"
        );

        let params = ChatParams {
            model: self.model.clone(),
            messages,
            tools,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tool_choice: ToolChoice::Auto,
        };

        Ok(self.provider.chat(params).await?)
    }
}

/// Intro text, a blank line, then one rendering per line.
fn combined_transcript(content: Option<&str>, results: &[ToolResult]) -> String {
    let rendered: Vec<String> = results.iter().map(ToolResult::render).collect();
    let block = rendered.join("\n");
    match content.filter(|c| !c.is_empty()) {
        Some(intro) => format!("{}\n\n{}", intro, block),
        None => block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolError, ToolOutput};

    fn failed(name: &str) -> ToolResult {
        ToolResult {
            tool_call_id: "c".to_string(),
            name: name.to_string(),
            outcome: Err(ToolError::UnknownTool(name.to_string())),
        }
    }

    #[test]
    fn test_combined_transcript_with_intro() {
        let results = vec![failed("a"), failed("b")];
        assert_eq!(
            combined_transcript(Some("Let me check."), &results),
            "Let me check.\n\n[Tool Error: Unknown tool: a]\n[Tool Error: Unknown tool: b]"
        );
    }

    #[test]
    fn test_combined_transcript_without_intro() {
        let results = vec![ToolResult {
            tool_call_id: "c".to_string(),
            name: "get_booking".to_string(),
            outcome: Ok(ToolOutput::Listed(Vec::new())),
        }];
        assert_eq!(
            combined_transcript(None, &results),
            "[No bookings found matching the criteria]"
        );
        assert_eq!(
            combined_transcript(Some(""), &results),
            "[No bookings found matching the criteria]"
        );
    }

    #[test]
    fn test_default_options() {
        let opts = TurnOptions::default();
        assert!(opts.use_tools);
        assert!(!opts.use_rag);
    }
}
