//! Conversation Types
//!
//! The turn a caller sends in and the merged response it gets back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use builder_agent_core::Project;
use builder_agent_llm::{ProviderType, UsageStats};
use builder_agent_tools::ToolCallRecord;

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// A prior turn in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
    /// Tool calls this turn produced (assistant entries only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCallRecord>) -> Self {
        Self {
            role: HistoryRole::Assistant,
            content: content.into(),
            tool_calls,
        }
    }
}

/// Metadata the orchestrator attaches to a synthesized follow-up turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinuationContext {
    pub workflow_continuation: bool,
    /// Tool the provider must call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_tool: Option<String>,
    /// Arguments carried over from the previous tool's result
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub continuation_args: Map<String, Value>,
}

impl ContinuationContext {
    pub fn forcing(tool: impl Into<String>, continuation_args: Map<String, Value>) -> Self {
        Self {
            workflow_continuation: true,
            force_tool: Some(tool.into()),
            continuation_args,
        }
    }

    /// Tool to force, if this is a workflow continuation.
    pub fn forced_tool(&self) -> Option<&str> {
        if self.workflow_continuation {
            self.force_tool.as_deref()
        } else {
            None
        }
    }
}

/// One user message plus everything a provider needs to answer it.
///
/// Immutable once dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub message: String,
    pub project: Project,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Backend to use; the orchestrator's current provider when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContinuationContext>,
}

impl ChatTurn {
    pub fn new(message: impl Into<String>, project: Project) -> Self {
        Self {
            message: message.into(),
            project,
            history: Vec::new(),
            provider: None,
            context: None,
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }

    pub fn with_provider(mut self, provider: ProviderType) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_context(mut self, context: ContinuationContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Tool this turn must call, if it is a workflow continuation.
    pub fn forced_tool(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.forced_tool())
    }
}

/// Category of a failed chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatErrorKind {
    /// The selected provider is not configured
    ProviderUnavailable,
    /// The backend could not be reached or returned an error
    Transport,
    /// The backend asked for a tool the registry does not have
    UnknownTool,
    /// The action budget was already spent
    BudgetExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Why a continuation chain stopped although a rule wanted to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    BudgetExhausted,
    /// The tool's `max_chain_length` was reached
    ChainLimit,
    /// The orchestrator's `max_continuations` was reached
    ContinuationLimit,
}

/// Merged result of one top-level chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    /// Every tool call, in execution order
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRecord>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ChatError>,
    /// Provider that answered the last step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderType>,
    #[serde(default)]
    pub usage: UsageStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halted: Option<HaltReason>,
}

impl ChatResponse {
    pub fn ok(message: impl Into<String>, provider: ProviderType) -> Self {
        Self {
            message: message.into(),
            tool_calls: Vec::new(),
            success: true,
            error: None,
            provider: Some(provider),
            usage: UsageStats::default(),
            halted: None,
        }
    }

    pub fn failure(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: message.clone(),
            tool_calls: Vec::new(),
            success: false,
            error: Some(ChatError::new(kind, message)),
            provider: None,
            usage: UsageStats::default(),
            halted: None,
        }
    }

    pub fn error_kind(&self) -> Option<ChatErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
