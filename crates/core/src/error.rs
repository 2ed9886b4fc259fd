//! Core Error Types
//!
//! Defines the foundational error types used across the Builder Agent workspace.
//! These error types are dependency-free (only thiserror + std) to keep the core
//! crate lightweight.
//!
//! Provider transport errors (`LlmError`) and tool execution errors
//! (`ToolError`, `ExecutorError`) live in their own crates.

use thiserror::Error;

/// Core error type for the Builder Agent workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Registry consistency errors (dangling continuation targets, zero
    /// chain lengths)
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
