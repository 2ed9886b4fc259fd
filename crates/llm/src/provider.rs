//! LLM Provider Trait
//!
//! Defines the common interface for all LLM providers.

use async_trait::async_trait;

use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig, ProviderType,
    ToolDefinition,
};

/// Trait that all LLM providers must implement.
///
/// A provider is pure transport: it translates the shared message and tool
/// types into its backend's native format, performs one round trip, and
/// parses the result. Tool execution and multi-round logic live above it.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the provider type this implementation serves.
    fn provider_type(&self) -> ProviderType;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Returns whether this provider supports tool calling.
    fn supports_tools(&self) -> bool;

    /// Returns whether the backend API can be told to call one specific tool.
    ///
    /// When false, callers fall back to `ToolCallMode::Required` plus a
    /// prompt instruction naming the tool.
    fn supports_forced_tool_choice(&self) -> bool {
        true
    }

    /// Send a message and get a complete response.
    ///
    /// # Arguments
    /// * `messages` - Conversation history
    /// * `system` - Optional system prompt
    /// * `tools` - Available tools for the model to use
    /// * `request_options` - Tool choice and sampling overrides
    ///
    /// # Returns
    /// Complete response from the model
    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse>;

    /// Get the configuration for this provider.
    fn config(&self) -> &ProviderConfig;
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => {
            // Try to extract model name from body
            LlmError::ModelNotFound {
                model: body.to_string(),
            }
        }
        429 => {
            // Try to parse retry-after from body
            LlmError::RateLimited {
                message: body.to_string(),
                retry_after: None,
            }
        }
        400 | 413 if is_context_overflow(body) => LlmError::ContextLengthExceeded {
            message: body.to_string(),
            max_tokens: None,
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}

/// Backends report an oversized prompt as a 400 with a recognizable message.
fn is_context_overflow(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("context length")
        || lower.contains("context_length_exceeded")
        || lower.contains("prompt is too long")
}
