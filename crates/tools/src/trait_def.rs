//! Tool Trait
//!
//! Defines the unified `Tool` interface that every callable operation
//! implements, plus `FunctionTool` for closure-based tools supplied by an
//! application at startup.
//!
//! A tool declares its identity, its parameter schema, and optionally the
//! continuation rule the orchestrator consults after it runs. Execution
//! receives a `ToolContext` and nothing else.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;

use builder_agent_core::ToolContext;
use builder_agent_llm::{ParameterSchema, ToolDefinition};

use crate::executor::{ToolError, ToolOutput};
use crate::registry::ContinuationRule;

/// Unified tool interface.
///
/// Tools are registered once in a `ToolRegistry` and dispatched by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name of this tool (e.g., "generate_component")
    fn name(&self) -> &str;

    /// Human-readable description of what this tool does
    fn description(&self) -> &str;

    /// JSON schema describing the tool's input parameters
    fn parameters_schema(&self) -> ParameterSchema;

    /// Follow-up the orchestrator may chain after a successful call.
    fn continuation(&self) -> Option<ContinuationRule> {
        None
    }

    /// Execute the tool. Arguments have already been validated against
    /// `parameters_schema`.
    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError>;

    /// Provider-facing definition.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Boxed future returned by a `FunctionTool` handler.
pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>>;

/// Type alias for the async handler function used by `FunctionTool`.
pub type FunctionToolHandler = Box<dyn for<'a> Fn(&'a ToolContext, Value) -> ToolFuture<'a> + Send + Sync>;

/// A tool created from an async closure.
///
/// # Example
///
/// ```ignore
/// let tool = FunctionTool::new(
///     "echo",
///     "Echoes the input",
///     ParameterSchema::object(None, HashMap::new(), vec![]),
///     |_ctx, args| Box::pin(async move {
///         Ok(ToolOutput::with_data("echoed", args))
///     }),
/// );
/// ```
pub struct FunctionTool {
    tool_name: String,
    tool_description: String,
    schema: ParameterSchema,
    handler: FunctionToolHandler,
    continuation: Option<ContinuationRule>,
}

impl FunctionTool {
    /// Create a new FunctionTool from an async closure.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: ParameterSchema,
        handler: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a ToolContext, Value) -> ToolFuture<'a> + Send + Sync + 'static,
    {
        Self {
            tool_name: name.into(),
            tool_description: description.into(),
            schema,
            handler: Box::new(handler),
            continuation: None,
        }
    }

    /// Attach a continuation rule.
    pub fn with_continuation(mut self, rule: ContinuationRule) -> Self {
        self.continuation = Some(rule);
        self
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.tool_name
    }

    fn description(&self) -> &str {
        &self.tool_description
    }

    fn parameters_schema(&self) -> ParameterSchema {
        self.schema.clone()
    }

    fn continuation(&self) -> Option<ContinuationRule> {
        self.continuation.clone()
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        (self.handler)(ctx, args).await
    }
}
