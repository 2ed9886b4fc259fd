//! Builder Agent LLM
//!
//! Provides a unified interface for interacting with multiple LLM providers:
//! - Anthropic Claude
//! - OpenAI (GPT-4o, o-series)
//! - DeepSeek
//!
//! Each provider translates the shared message and tool types into its
//! backend's native request format and parses the native response back.

pub mod anthropic;
pub mod deepseek;
pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use anthropic::AnthropicProvider;
pub use deepseek::DeepSeekProvider;
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;

use std::sync::Arc;

/// Construct the provider implementation for a configuration.
pub fn create_provider(config: ProviderConfig) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderType::Anthropic => Arc::new(AnthropicProvider::new(config)?),
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config)?),
        ProviderType::DeepSeek => Arc::new(DeepSeekProvider::new(config)?),
    };
    Ok(provider)
}
