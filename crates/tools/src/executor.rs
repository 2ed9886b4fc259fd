//! Tool Executor
//!
//! Runs a registered tool by name against the project, converting every
//! failure inside a tool (error return, invalid arguments, panic) into a soft
//! `ToolCallResult` with `success: false`. Only an unknown tool name is a hard
//! error, since it means the provider and registry disagree.
//!
//! The executor also remembers the user's original message and how many tools
//! ran for the current logical request. The orchestrator reads both through
//! `evaluate_condition` when deciding whether to chain a continuation.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use builder_agent_core::{new_id, Project, ToolContext};

use crate::registry::{ContinuationCondition, ToolRegistry};
use crate::validation::validate_args;

/// Most tool calls an `IfUserIntentComplete` continuation may follow.
pub const MAX_INTENT_STEPS: usize = 8;

/// Words in the user's message that mean a UI component was asked for.
const COMPONENT_TRIGGERS: &[&str] = &[
    "component", "button", "card", "form", "navbar", "header", "footer", "layout", "page",
    "section", "widget", "ui",
];

/// Words in the user's message that describe a multi-step request.
const INTENT_TRIGGERS: &[&str] = &[
    "and then", "then", "also", "complete", "full", "entire", "end-to-end", "finish",
];

/// What a tool implementation returns on success.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Short human-readable description of what happened
    pub summary: String,
    /// Structured result; continuation bindings read from here
    pub data: Value,
}

impl ToolOutput {
    pub fn message(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            data: Value::Null,
        }
    }

    pub fn with_data(summary: impl Into<String>, data: Value) -> Self {
        Self {
            summary: summary.into(),
            data,
        }
    }
}

/// Error raised by a tool implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// An external generator or uploader failed
    #[error("{0}")]
    Collaborator(String),

    #[error("UI action failed: {0}")]
    Ui(String),

    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    pub fn invalid_args(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }
}

/// Uniform result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallResult {
    pub fn ok(output: ToolOutput) -> Self {
        Self {
            success: true,
            data: output.data,
            summary: output.summary,
            error: None,
        }
    }

    /// Failed result for `tool` with a readable summary.
    pub fn failure(tool: &str, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            data: Value::Null,
            summary: format!("{} failed: {}", tool, error),
            error: Some(error),
        }
    }

    /// Content string handed back to the model in the follow-up round.
    pub fn to_content(&self) -> String {
        if self.success {
            if self.data.is_null() {
                self.summary.clone()
            } else {
                format!("{}\n{}", self.summary, self.data)
            }
        } else {
            format!(
                "Error: {}",
                self.error.as_deref().unwrap_or(self.summary.as_str())
            )
        }
    }
}

/// One executed tool call, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub function: String,
    pub args: Value,
    pub result: ToolCallResult,
}

/// Hard executor failure that aborts the turn.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

#[derive(Debug, Default)]
struct RequestState {
    /// Original user message, lower-cased
    message: String,
    executed: usize,
}

/// Dispatches tool calls for one orchestrator.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    context: ToolContext,
    state: Mutex<RequestState>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, context: ToolContext) -> Self {
        Self {
            registry,
            context,
            state: Mutex::new(RequestState::default()),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Replace the project snapshot tools see on later calls.
    pub fn refresh_project(&mut self, project: Project) {
        self.context = self.context.with_project(Arc::new(project));
    }

    /// Start a new logical request. Continuations of the same request must not
    /// call this.
    pub fn begin_request(&self, message: &str) {
        let mut state = self.lock_state();
        state.message = message.to_lowercase();
        state.executed = 0;
    }

    /// Number of tools that ran since `begin_request`.
    pub fn tools_executed(&self) -> usize {
        self.lock_state().executed
    }

    /// Execute a tool with a generated call id.
    pub async fn execute(&self, name: &str, args: Value) -> Result<ToolCallResult, ExecutorError> {
        self.execute_call(&new_id("call"), name, args).await
    }

    /// Execute a tool for a provider-assigned call id.
    pub async fn execute_call(
        &self,
        call_id: &str,
        name: &str,
        args: Value,
    ) -> Result<ToolCallResult, ExecutorError> {
        let tool = self
            .registry
            .tool(name)
            .ok_or_else(|| ExecutorError::UnknownTool(name.to_string()))?;

        self.lock_state().executed += 1;

        if let Err(message) = validate_args(&tool.parameters_schema(), &args) {
            tracing::warn!(tool = name, "rejected arguments: {}", message);
            return Ok(ToolCallResult::failure(
                name,
                ToolError::invalid_args(message).to_string(),
            ));
        }

        let ctx = self.context.for_call(call_id);
        tracing::debug!(tool = name, call_id, "executing tool");

        let outcome = AssertUnwindSafe(tool.execute(&ctx, args)).catch_unwind().await;
        let result = match outcome {
            Ok(Ok(output)) => ToolCallResult::ok(output),
            Ok(Err(err)) => {
                tracing::warn!(tool = name, "tool failed: {}", err);
                ToolCallResult::failure(name, err.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(tool = name, "tool panicked: {}", message);
                ToolCallResult::failure(name, format!("internal error: {}", message))
            }
        };

        Ok(result)
    }

    /// Evaluate a continuation condition against the current request.
    pub fn evaluate_condition(&self, condition: &ContinuationCondition) -> bool {
        let state = self.lock_state();
        match condition {
            ContinuationCondition::Always => true,
            ContinuationCondition::IfComponentRequested => {
                mentions_any(&state.message, COMPONENT_TRIGGERS)
            }
            ContinuationCondition::IfUserIntentComplete => {
                mentions_any(&state.message, INTENT_TRIGGERS)
                    && state.executed < MAX_INTENT_STEPS
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, RequestState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Whole-word match of any trigger. A trigger may span several words
/// ("and then") and a single-word trigger also matches its plural.
fn mentions_any(message: &str, triggers: &[&str]) -> bool {
    let words = split_words(message);
    triggers.iter().any(|trigger| {
        let phrase = split_words(trigger);
        match phrase.as_slice() {
            [] => false,
            [single] => words
                .iter()
                .any(|w| w == single || w.strip_suffix('s') == Some(single.as_str())),
            _ => words.windows(phrase.len()).any(|window| window == phrase.as_slice()),
        }
    })
}

fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}
