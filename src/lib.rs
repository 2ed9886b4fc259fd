//! Builder Agent
//!
//! Multi-provider tool-calling orchestration for a UI building agent.
//!
//! - `orchestrator` - the façade: provider selection, action budget, and
//!   continuation chaining for one logical request
//! - `adapter` - one turn against one backend, tools executed in call order
//! - `providers` - the set of configured backends and their availability
//! - `batch` - a bounded loop over several messages with provider auto-switch
//! - `conversation` - turn and response types
//! - `budget` - the action budget
//! - `config` - TOML configuration
//! - `error` - errors raised before a chat starts

pub mod adapter;
pub mod batch;
pub mod budget;
pub mod config;
pub mod conversation;
pub mod error;
pub mod orchestrator;
pub mod providers;

pub use adapter::{history_to_messages, ProviderAdapter};
pub use batch::{BatchItem, BatchOptions, BatchReport, BatchRunner};
pub use budget::{ActionBudget, BudgetStatus, DEFAULT_ACTION_BUDGET};
pub use config::{AgentConfig, BatchSection, ProviderSection};
pub use conversation::{
    ChatError, ChatErrorKind, ChatResponse, ChatTurn, ContinuationContext, HaltReason,
    HistoryEntry, HistoryRole,
};
pub use error::{AgentError, AgentResult};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use providers::ProviderSet;
