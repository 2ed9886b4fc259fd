//! Orchestrator
//!
//! The façade callers talk to. For each top-level chat it selects the
//! provider, checks the action budget, runs the turn through the adapter,
//! and then decides whether the last tool call's continuation rule should
//! chain another, forced turn. All steps of one request are merged into a
//! single `ChatResponse`.
//!
//! One request runs at a time per orchestrator. The budget and the tool
//! executor's request state are shared by every step of a chain.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use builder_agent_core::{new_id, NoUi, Project, ProjectSink, ToolContext, UiActions};
use builder_agent_llm::{ProviderType, UsageStats};
use builder_agent_tools::{default_registry, Collaborators, ToolExecutor, ToolRegistry};

use crate::adapter::ProviderAdapter;
use crate::budget::{ActionBudget, BudgetStatus, DEFAULT_ACTION_BUDGET};
use crate::config::AgentConfig;
use crate::conversation::{
    ChatError, ChatErrorKind, ChatResponse, ChatTurn, ContinuationContext, HaltReason, HistoryEntry,
};
use crate::error::AgentResult;
use crate::providers::ProviderSet;

/// Appended when the budget stops a chain the tools wanted to continue.
const BUDGET_HALT_NOTE: &str =
    "Stopped early: the action budget is exhausted. Reset it to let the assistant keep working.";

/// Orchestrator limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Tool calls allowed before an explicit reset
    #[serde(default = "default_action_budget")]
    pub action_budget: u32,
    /// Continuation turns allowed per top-level request
    #[serde(default = "default_max_continuations")]
    pub max_continuations: u32,
}

fn default_action_budget() -> u32 {
    DEFAULT_ACTION_BUDGET
}

fn default_max_continuations() -> u32 {
    8
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            action_budget: default_action_budget(),
            max_continuations: default_max_continuations(),
        }
    }
}

/// What to do after a step.
enum Next {
    Continue(ChatTurn),
    Stop,
    Halt(HaltReason),
}

/// Merges the steps of one request.
#[derive(Default)]
struct Accumulator {
    messages: Vec<String>,
    response: Option<ChatResponse>,
}

impl Accumulator {
    fn absorb(&mut self, step: ChatResponse) {
        if !step.message.trim().is_empty() {
            self.messages.push(step.message.clone());
        }
        match self.response.as_mut() {
            None => self.response = Some(step),
            Some(acc) => {
                acc.tool_calls.extend(step.tool_calls);
                acc.success = acc.success && step.success;
                if acc.error.is_none() {
                    acc.error = step.error;
                }
                acc.usage.accumulate(&step.usage);
                if step.provider.is_some() {
                    acc.provider = step.provider;
                }
            }
        }
    }

    fn finish(self, halted: Option<HaltReason>) -> ChatResponse {
        let mut response = self.response.unwrap_or_else(|| ChatResponse {
            message: String::new(),
            tool_calls: Vec::new(),
            success: true,
            error: None,
            provider: None,
            usage: UsageStats::default(),
            halted: None,
        });
        let mut messages = self.messages;
        if halted == Some(HaltReason::BudgetExhausted) {
            // Exhaustion is never reported as success.
            messages.push(BUDGET_HALT_NOTE.to_string());
            response.success = false;
            if response.error.is_none() {
                response.error = Some(ChatError::new(
                    ChatErrorKind::BudgetExhausted,
                    BUDGET_HALT_NOTE,
                ));
            }
        }
        response.message = messages.join("\n\n");
        response.halted = halted;
        response
    }
}

pub struct Orchestrator {
    registry: Arc<ToolRegistry>,
    providers: RwLock<ProviderSet>,
    budget: Mutex<ActionBudget>,
    sink: Arc<dyn ProjectSink>,
    ui: Arc<dyn UiActions>,
    config: OrchestratorConfig,
    session_id: String,
    /// Serializes top-level requests
    request_gate: tokio::sync::Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ToolRegistry>,
        providers: ProviderSet,
        sink: Arc<dyn ProjectSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            providers: RwLock::new(providers),
            budget: Mutex::new(ActionBudget::new(config.action_budget)),
            sink,
            ui: Arc::new(NoUi),
            config,
            session_id: new_id("session"),
            request_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Build from configuration with the default tool catalog.
    pub fn from_config(
        config: &AgentConfig,
        collaborators: &Collaborators,
        sink: Arc<dyn ProjectSink>,
    ) -> AgentResult<Self> {
        let registry = Arc::new(default_registry(collaborators)?);
        let providers =
            ProviderSet::from_configs(config.provider_configs(), config.default_provider);
        Ok(Self::new(
            registry,
            providers,
            sink,
            config.orchestrator_config(),
        ))
    }

    /// Attach presentation-layer hooks.
    pub fn with_ui(mut self, ui: Arc<dyn UiActions>) -> Self {
        self.ui = ui;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Latest project document from the sink, if it shares one.
    pub fn project_snapshot(&self) -> Option<Project> {
        self.sink.snapshot()
    }

    // ── Providers ─────────────────────────────────────────────────────

    pub fn get_available_providers(&self) -> Vec<ProviderType> {
        self.with_providers(|p| p.available())
    }

    pub fn get_current_provider(&self) -> ProviderType {
        self.with_providers(|p| p.current())
    }

    /// Switch the default provider. Returns false when it is unavailable.
    pub fn set_current_provider(&self, id: ProviderType) -> bool {
        let switched = self.with_providers_mut(|p| p.set_current(id));
        if switched {
            info!(provider = %id, "current provider changed");
        } else {
            warn!(provider = %id, "refused to switch to unavailable provider");
        }
        switched
    }

    /// Set or clear one provider's credential without touching the others.
    pub fn set_provider_credential(&self, id: ProviderType, api_key: Option<String>) {
        self.with_providers_mut(|p| p.set_credential(id, api_key));
    }

    /// Next available provider after `id` in preference order.
    pub fn next_available_provider(&self, id: ProviderType) -> Option<ProviderType> {
        self.with_providers(|p| p.next_available(id))
    }

    // ── Budget ────────────────────────────────────────────────────────

    pub fn get_action_budget(&self) -> BudgetStatus {
        self.lock_budget().status()
    }

    pub fn set_action_budget(&self, limit: u32) {
        self.lock_budget().set_limit(limit);
    }

    pub fn reset_action_budget(&self) {
        self.lock_budget().reset();
    }

    // ── Chat ──────────────────────────────────────────────────────────

    /// Run one logical request, including any continuation chain.
    pub async fn chat(&self, turn: ChatTurn) -> ChatResponse {
        let _gate = self.request_gate.lock().await;
        let request_id = new_id("req");

        info!(
            request_id = %request_id,
            provider = ?turn.provider,
            history = turn.history.len(),
            "chat request"
        );

        let context = ToolContext::new(
            self.session_id.clone(),
            Arc::new(turn.project.clone()),
            Arc::clone(&self.sink),
            Arc::clone(&self.ui),
        );
        let mut executor = ToolExecutor::new(Arc::clone(&self.registry), context);
        executor.begin_request(&turn.message);

        let mut acc = Accumulator::default();
        let mut chain_depth: HashMap<String, u32> = HashMap::new();
        let mut continuations = 0u32;
        let mut current = turn;
        let mut halted = None;

        loop {
            // Dispatch
            let provider_id = current
                .provider
                .unwrap_or_else(|| self.get_current_provider());
            let Some(provider) = self.with_providers(|p| p.get(provider_id)) else {
                warn!(request_id = %request_id, provider = %provider_id, "provider unavailable");
                let mut response = ChatResponse::failure(
                    ChatErrorKind::ProviderUnavailable,
                    format!(
                        "The {} provider is not available. Configure its API key or choose another provider.",
                        provider_id
                    ),
                );
                response.provider = Some(provider_id);
                acc.absorb(response);
                break;
            };

            // Budget check
            let allowance = {
                let budget = self.lock_budget();
                if budget.is_exhausted() {
                    None
                } else {
                    Some(budget.remaining())
                }
            };
            let Some(allowance) = allowance else {
                info!(request_id = %request_id, "action budget exhausted");
                acc.absorb(ChatResponse::failure(
                    ChatErrorKind::BudgetExhausted,
                    "The action budget is exhausted. Reset it to let the assistant keep working.",
                ));
                break;
            };

            // Execute
            let step = ProviderAdapter::new(provider)
                .chat(&current, &executor, allowance as usize)
                .await;
            self.lock_budget().consume(step.tool_calls.len() as u32);

            debug!(
                request_id = %request_id,
                provider = %provider_id,
                tool_calls = step.tool_calls.len(),
                success = step.success,
                "step finished"
            );

            // Continuation decision
            let next = self.next_turn(
                &current,
                &step,
                provider_id,
                &executor,
                &mut chain_depth,
                continuations,
            );
            acc.absorb(step);

            match next {
                Next::Continue(turn) => {
                    continuations += 1;
                    executor.refresh_project(turn.project.clone());
                    current = turn;
                }
                Next::Stop => break,
                Next::Halt(reason) => {
                    info!(request_id = %request_id, ?reason, "continuation halted");
                    halted = Some(reason);
                    break;
                }
            }
        }

        let response = acc.finish(halted);
        info!(
            request_id = %request_id,
            tool_calls = response.tool_calls.len(),
            continuations,
            success = response.success,
            "chat finished"
        );
        response
    }

    /// Decide whether the step's last tool call chains a continuation.
    fn next_turn(
        &self,
        current: &ChatTurn,
        step: &ChatResponse,
        provider_id: ProviderType,
        executor: &ToolExecutor,
        chain_depth: &mut HashMap<String, u32>,
        continuations: u32,
    ) -> Next {
        if !step.success {
            return Next::Stop;
        }
        let Some(last) = step.tool_calls.last() else {
            return Next::Stop;
        };
        if !last.result.success {
            return Next::Stop;
        }
        let Some(rule) = self.registry.continuation_for(&last.function) else {
            return Next::Stop;
        };
        if !executor.evaluate_condition(&rule.condition) {
            debug!(tool = %last.function, condition = ?rule.condition, "continuation condition not met");
            return Next::Stop;
        }

        let depth = chain_depth.entry(last.function.clone()).or_insert(0);
        if *depth >= rule.max_chain_length {
            return Next::Halt(HaltReason::ChainLimit);
        }
        if continuations >= self.config.max_continuations {
            return Next::Halt(HaltReason::ContinuationLimit);
        }
        if self.lock_budget().is_exhausted() {
            return Next::Halt(HaltReason::BudgetExhausted);
        }
        *depth += 1;

        let args = rule.carried_args(&last.result.data);
        info!(
            from = %last.function,
            to = %rule.next_tool,
            carried = args.len(),
            "chaining continuation"
        );

        let mut history = current.history.clone();
        history.push(HistoryEntry::user(current.message.clone()));
        history.push(HistoryEntry::assistant(
            step.message.clone(),
            step.tool_calls.clone(),
        ));

        let project = self
            .sink
            .snapshot()
            .unwrap_or_else(|| current.project.clone());

        Next::Continue(
            ChatTurn::new(
                format!(
                    "Continue the workflow: call {} using the result of {}.",
                    rule.next_tool, last.function
                ),
                project,
            )
            .with_history(history)
            .with_provider(provider_id)
            .with_context(ContinuationContext::forcing(rule.next_tool.clone(), args)),
        )
    }

    fn with_providers<T>(&self, f: impl FnOnce(&ProviderSet) -> T) -> T {
        match self.providers.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn with_providers_mut<T>(&self, f: impl FnOnce(&mut ProviderSet) -> T) -> T {
        match self.providers.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn lock_budget(&self) -> std::sync::MutexGuard<'_, ActionBudget> {
        match self.budget.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("session_id", &self.session_id)
            .field("tools", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}
