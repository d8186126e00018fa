//! OpenAI-compatible chat-completions client.

use crate::*;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        Self::with_timeout(api_key, api_base, default_model, Duration::from_secs(60))
    }

    /// Every request is bounded by `timeout`; expiry surfaces as [`ProviderError::Request`].
    pub fn with_timeout(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
        timeout: Duration,
    ) -> Self {
        let api_base = api_base
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let default_model = default_model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            default_model,
        }
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| {
                let mut obj = json!({ "role": m.role });
                if let Some(content) = &m.content {
                    obj["content"] = json!(content);
                }
                if let Some(tool_calls) = &m.tool_calls {
                    obj["tool_calls"] = json!(tool_calls);
                }
                if let Some(tool_call_id) = &m.tool_call_id {
                    obj["tool_call_id"] = json!(tool_call_id);
                }
                if let Some(name) = &m.name {
                    obj["name"] = json!(name);
                }
                obj
            })
            .collect();

        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if !params.tools.is_empty() {
            body["tools"] = json!(params.tools);
            body["tool_choice"] = json!(params.tool_choice.as_str());
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        let content = message["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let function = &call["function"];
                let id = call["id"].as_str().unwrap_or("");
                let name = function["name"].as_str().unwrap_or("");
                tool_calls.push(match &function["arguments"] {
                    serde_json::Value::String(raw) => ToolCall::from_raw(id, name, raw.as_str()),
                    serde_json::Value::Null => ToolCall::new(id, name, json!({})),
                    other => ToolCall::new(id, name, other.clone()),
                });
            }
        }

        let usage = match json["usage"].as_object() {
            Some(usage) => Usage {
                prompt_tokens: usage
                    .get("prompt_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                completion_tokens: usage
                    .get("completion_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                total_tokens: usage
                    .get("total_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
            },
            None => Usage::default(),
        };

        Ok(ChatResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if !self.is_configured() {
            return Err(ProviderError::NoApiKey);
        }

        let url = format!("{}/chat/completions", self.api_base);
        trace!("POST {}", url);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }

        let text = response.text().await?;
        if !status.is_success() {
            let error = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(ProviderError::Api(error));
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        let parsed = self.parse_response(json)?;

        debug!(
            tool_calls = parsed.tool_calls.len(),
            total_tokens = parsed.usage.total_tokens,
            "chat completion received"
        );

        Ok(parsed)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_uses_openai_defaults() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
        assert_eq!(provider.default_model(), DEFAULT_MODEL);
        assert!(provider.is_configured());
    }

    #[test]
    fn test_new_with_custom_base_and_model() {
        let provider = OpenAiProvider::new(
            "sk-test",
            Some("http://localhost:8000/v1/".to_string()),
            Some("local-model".to_string()),
        );
        assert_eq!(provider.api_base, "http://localhost:8000/v1");
        assert_eq!(provider.default_model(), "local-model");
    }

    #[test]
    fn test_empty_key_is_not_configured() {
        let provider = OpenAiProvider::new("", None, None);
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_build_request_without_tools() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let params = ChatParams {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::system("Be brief"), Message::user("Hello")],
            ..Default::default()
        };

        let request = provider.build_request(&params);

        assert_eq!(request["model"], "gpt-4o-mini");
        assert_eq!(request["max_tokens"], 1000);
        assert!(request.get("tools").is_none());
        assert!(request.get("tool_choice").is_none());

        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Hello");
    }

    #[test]
    fn test_build_request_falls_back_to_default_model() {
        let provider = OpenAiProvider::new("sk-test", None, Some("gpt-4o".to_string()));
        let request = provider.build_request(&ChatParams::default());
        assert_eq!(request["model"], "gpt-4o");
    }

    #[test]
    fn test_build_request_with_tools_auto_choice() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let params = ChatParams {
            messages: vec![Message::user("Book a massage")],
            tools: vec![Tool::new(
                "create_booking",
                "Create a new booking",
                json!({"type": "object", "properties": {}}),
            )],
            ..Default::default()
        };

        let request = provider.build_request(&params);

        let tools = request["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "create_booking");
        assert_eq!(request["tool_choice"], "auto");
    }

    #[test]
    fn test_build_request_tool_round_messages() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let def = ToolCallDef::new("call_1", "get_booking", r#"{"booking_id":"b1"}"#);
        let params = ChatParams {
            messages: vec![
                Message::assistant_tool_calls("", vec![def]),
                Message::tool("call_1", "get_booking", "{\"success\":true}"),
            ],
            ..Default::default()
        };

        let request = provider.build_request(&params);
        let messages = request["messages"].as_array().unwrap();

        assert_eq!(messages[0]["tool_calls"][0]["id"], "call_1");
        assert_eq!(
            messages[0]["tool_calls"][0]["function"]["arguments"],
            "{\"booking_id\":\"b1\"}"
        );
        assert_eq!(messages[1]["role"], "tool");
        assert_eq!(messages[1]["tool_call_id"], "call_1");
    }

    #[test]
    fn test_parse_response_simple() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let response = provider
            .parse_response(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "Hello!"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            }))
            .unwrap();

        assert_eq!(response.content.as_deref(), Some("Hello!"));
        assert!(!response.has_tool_calls());
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let response = provider
            .parse_response(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_123",
                            "type": "function",
                            "function": {
                                "name": "get_booking",
                                "arguments": "{\"customer_email\": \"ann@x.com\"}"
                            }
                        }]
                    },
                    "finish_reason": "tool_calls"
                }]
            }))
            .unwrap();

        assert!(response.content.is_none());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_123");
        assert_eq!(
            response.tool_calls[0].arguments,
            json!({"customer_email": "ann@x.com"})
        );
        assert_eq!(
            response.tool_calls[0].raw_arguments.as_deref(),
            Some("{\"customer_email\": \"ann@x.com\"}")
        );
        assert_eq!(response.usage.total_tokens, 0);
    }

    #[test]
    fn test_parse_response_keeps_unparseable_arguments() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let response = provider
            .parse_response(json!({
                "choices": [{
                    "message": {
                        "tool_calls": [{
                            "id": "call_1",
                            "function": {"name": "get_booking", "arguments": "not json"}
                        }]
                    }
                }]
            }))
            .unwrap();

        assert_eq!(response.tool_calls[0].arguments, json!("not json"));
        assert_eq!(response.tool_calls[0].raw_arguments.as_deref(), Some("not json"));
        assert_eq!(response.finish_reason, "stop");
    }

    #[test]
    fn test_parse_response_empty_choices() {
        let provider = OpenAiProvider::new("sk-test", None, None);
        let result = provider.parse_response(json!({"choices": []}));
        assert!(matches!(result, Err(ProviderError::InvalidResponse)));
    }

    #[tokio::test]
    async fn test_chat_without_key_fails_fast() {
        let provider = OpenAiProvider::new("", None, None);
        let result = provider.chat(ChatParams::default()).await;
        assert!(matches!(result, Err(ProviderError::NoApiKey)));
    }
}
