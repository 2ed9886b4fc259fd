//! DeepSeek Provider
//!
//! Implementation of the LlmProvider trait for DeepSeek's OpenAI-compatible
//! API. DeepSeek accepts `tool_choice: "required"` but does not reliably honor
//! a named function, so forced tool selection is left to the caller's prompt.

use async_trait::async_trait;

use super::http_client::{build_http_client, post_json};
use super::openai::{parse_arguments, OpenAIResponse};
use super::provider::{missing_api_key_error, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageContent, MessageRole,
    ProviderConfig, ProviderType, StopReason, ToolCall, ToolCallMode, ToolDefinition, UsageStats,
};

/// Default DeepSeek API endpoint
const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// DeepSeek provider
pub struct DeepSeekProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl DeepSeekProvider {
    /// Create a new DeepSeek provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.timeout_secs)?;
        Ok(Self { config, client })
    }

    /// Get the API base URL
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(DEEPSEEK_API_URL)
    }

    /// Reasoner (R1) models emit `<think>` blocks and have no tool calling
    fn model_is_reasoner(&self) -> bool {
        let model = self.config.model.to_lowercase();
        model.contains("r1") || model.contains("reasoner")
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": request_options
                .temperature_override
                .unwrap_or(self.config.temperature),
        });

        let mut api_messages: Vec<serde_json::Value> = Vec::new();
        if let Some(sys) = system {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }
        for msg in messages {
            api_messages.extend(self.message_to_deepseek(msg));
        }
        body["messages"] = serde_json::json!(api_messages);

        if !tools.is_empty() && self.supports_tools() {
            let api_tools: Vec<serde_json::Value> =
                tools.iter().map(|t| self.tool_to_deepseek(t)).collect();
            body["tools"] = serde_json::json!(api_tools);

            // A forced tool degrades to "required"; the prompt names the tool.
            let mode = if request_options.forced_tool.is_some() {
                ToolCallMode::Required
            } else {
                request_options.tool_call_mode
            };
            match mode {
                ToolCallMode::Auto => {}
                ToolCallMode::Required => body["tool_choice"] = serde_json::json!("required"),
                ToolCallMode::None => body["tool_choice"] = serde_json::json!("none"),
            }
        }

        for (key, value) in &self.config.options {
            body[key.as_str()] = value.clone();
        }

        body
    }

    /// Convert a Message to DeepSeek API format
    fn message_to_deepseek(&self, message: &Message) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        let mut tool_calls = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::ToolResult {
                    tool_use_id,
                    content,
                    ..
                } => out.push(serde_json::json!({
                    "role": "tool",
                    "tool_call_id": tool_use_id,
                    "content": content
                })),
                MessageContent::ToolUse { id, name, input } => {
                    tool_calls.push(serde_json::json!({
                        "id": id,
                        "type": "function",
                        "function": { "name": name, "arguments": input.to_string() }
                    }));
                }
                MessageContent::Text { .. } => {}
            }
        }
        if !out.is_empty() {
            return out;
        }

        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        };
        let mut msg = serde_json::json!({
            "role": role,
            "content": message.text_content()
        });
        if !tool_calls.is_empty() {
            msg["tool_calls"] = serde_json::json!(tool_calls);
        }
        vec![msg]
    }

    /// Convert a ToolDefinition to DeepSeek API format
    fn tool_to_deepseek(&self, tool: &ToolDefinition) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema
            }
        })
    }

    /// Parse a response from DeepSeek API
    fn parse_response(&self, response: &OpenAIResponse) -> LlmResult<LlmResponse> {
        let choice = response.choices.first();
        let mut content = None;
        let mut tool_calls = Vec::new();

        if let Some(msg) = choice.and_then(|c| c.message.as_ref()) {
            content = msg
                .content
                .as_deref()
                .and_then(strip_thinking);

            for tc in msg.tool_calls.iter().flatten() {
                tool_calls.push(ToolCall {
                    id: tc.id.clone(),
                    name: tc.function.name.clone(),
                    arguments: parse_arguments(&tc.function.arguments)?,
                });
            }
        }

        Ok(LlmResponse {
            content,
            tool_calls,
            stop_reason: choice
                .and_then(|c| c.finish_reason.as_deref())
                .map(StopReason::from)
                .unwrap_or(StopReason::EndTurn),
            usage: response
                .usage
                .as_ref()
                .map(|u| UsageStats {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                })
                .unwrap_or_default(),
            model: response.model.clone(),
        })
    }
}

/// Remove `<think>...</think>` sections, returning the remaining text if any.
fn strip_thinking(content: &str) -> Option<String> {
    let mut text = String::new();
    let mut rest = content;

    while let Some(start) = rest.find("<think>") {
        text.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    text.push_str(rest);

    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    fn name(&self) -> &'static str {
        "deepseek"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::DeepSeek
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn supports_tools(&self) -> bool {
        !self.model_is_reasoner()
    }

    fn supports_forced_tool_choice(&self) -> bool {
        false
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("deepseek"))?;

        let body = self.build_request_body(&messages, system.as_deref(), &tools, &request_options);

        let body_text = post_json(
            &self.client,
            self.base_url(),
            &[("Authorization", format!("Bearer {}", api_key))],
            &body,
            "deepseek",
        )
        .await?;

        let api_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        self.parse_response(&api_response)
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}
