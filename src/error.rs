//! Error Handling
//!
//! Error type for the parts of the agent that can fail before a chat starts:
//! loading configuration and building the tool registry.
//! Chat itself never fails with an error; failures travel inside
//! `ChatResponse`.

use thiserror::Error;

use builder_agent_core::CoreError;

/// Agent-level error type
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse errors (auto-converted from toml::de::Error)
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the core crate (registry validation and the like)
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for agent errors
pub type AgentResult<T> = Result<T, AgentError>;

impl AgentError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<AgentError> for String {
    fn from(err: AgentError) -> String {
        err.to_string()
    }
}
