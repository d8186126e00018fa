//! Prompt composer: builds the message lists sent to the model

use concierge_provider::{Message, Role, ToolCall, ToolCallDef};
use concierge_session::Message as StoredMessage;

use crate::prompts::SystemPrompt;
use crate::tools::ToolResult;

/// Builds outbound message lists from stored history.
///
/// Composition is pure: stored messages are never modified, and retrieved
/// context only ever lands in the outbound copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer {
    prompt: SystemPrompt,
}

impl PromptComposer {
    pub fn new(prompt: SystemPrompt) -> Self {
        Self { prompt }
    }

    pub fn prompt(&self) -> SystemPrompt {
        self.prompt
    }

    /// Messages for the first model call.
    ///
    /// A non-empty `augmentation` is prefixed to the last user message as
    /// `"<augmentation>\n\nUser Question: <content>"`. Without a user
    /// message it is dropped.
    pub fn compose(&self, history: &[StoredMessage], augmentation: Option<&str>) -> Vec<Message> {
        let mut messages = self.base(history);

        if let Some(aug) = augmentation.filter(|a| !a.is_empty()) {
            if let Some(last_user) = messages.iter_mut().rev().find(|m| m.role == Role::User) {
                let original = last_user.content.take().unwrap_or_default();
                last_user.content = Some(format!("{}\n\nUser Question: {}", aug, original));
            }
        }

        messages
    }

    /// Messages for the follow-up call after tools ran.
    ///
    /// System prompt and unaugmented history, then the assistant turn that
    /// requested the tools, then one tool message per result.
    pub fn compose_with_tool_results(
        &self,
        history: &[StoredMessage],
        assistant_content: Option<&str>,
        calls: &[ToolCall],
        results: &[ToolResult],
    ) -> Vec<Message> {
        let mut messages = self.base(history);

        let defs: Vec<ToolCallDef> = calls.iter().map(ToolCallDef::from).collect();
        messages.push(Message::assistant_tool_calls(
            assistant_content.unwrap_or(""),
            defs,
        ));

        for result in results {
            messages.push(Message::tool(
                &result.tool_call_id,
                &result.name,
                result.payload().to_string(),
            ));
        }

        messages
    }

    /// Exactly one system message, always first. A stored leading system
    /// message replaces the prompt; later ones are appended to it.
    fn base(&self, history: &[StoredMessage]) -> Vec<Message> {
        let (mut system, rest) = match history.split_first() {
            Some((first, rest)) if first.role == Role::System => (first.content.clone(), rest),
            _ => (self.prompt.text().to_string(), history),
        };

        let mut conversation = Vec::with_capacity(rest.len());
        for message in rest {
            if message.role == Role::System {
                system.push_str("\n\n");
                system.push_str(&message.content);
            } else {
                conversation.push(Message::new(message.role, message.content.clone()));
            }
        }

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(system));
        messages.extend(conversation);
        messages
    }
}
