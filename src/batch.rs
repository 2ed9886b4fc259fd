//! Batch Loop
//!
//! Drives [`Orchestrator::chat`] over a list of messages with a bounded
//! number of iterations. When a call fails because its provider could not
//! be reached, and auto-switch is enabled, the same message is retried on
//! the next available provider in preference order. The switched provider
//! is used for the rest of the batch.
//!
//! Budget and continuation handling stay inside the orchestrator; this loop
//! only decides which provider to ask next.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use builder_agent_core::Project;
use builder_agent_llm::ProviderType;

use crate::conversation::{ChatErrorKind, ChatResponse, ChatTurn, HaltReason, HistoryEntry};
use crate::orchestrator::Orchestrator;

/// Options for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Chat calls allowed, retries included
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub auto_switch_provider: bool,
    /// Starting provider; the orchestrator's current one when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderType>,
}

fn default_max_iterations() -> u32 {
    10
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            auto_switch_provider: false,
            provider: None,
        }
    }
}

/// One chat call made by the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub message: String,
    pub provider: ProviderType,
    pub response: ChatResponse,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Every chat call in order, retries included
    pub items: Vec<BatchItem>,
    pub iterations: u32,
    /// Messages that got a successful response
    pub completed: usize,
    pub stopped_by_budget: bool,
}

impl BatchReport {
    pub fn last_response(&self) -> Option<&ChatResponse> {
        self.items.last().map(|item| &item.response)
    }
}

pub struct BatchRunner<'a> {
    orchestrator: &'a Orchestrator,
}

impl<'a> BatchRunner<'a> {
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn run(
        &self,
        messages: &[String],
        project: Project,
        options: &BatchOptions,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut history: Vec<HistoryEntry> = Vec::new();
        let mut project = project;
        let mut provider = options
            .provider
            .unwrap_or_else(|| self.orchestrator.get_current_provider());

        'messages: for message in messages {
            let mut tried = vec![provider];

            loop {
                if report.iterations >= options.max_iterations {
                    warn!(
                        max_iterations = options.max_iterations,
                        "batch stopped at iteration limit"
                    );
                    break 'messages;
                }
                report.iterations += 1;

                let turn = ChatTurn::new(message.clone(), project.clone())
                    .with_history(history.clone())
                    .with_provider(provider);
                let response = self.orchestrator.chat(turn).await;

                if let Some(snapshot) = self.orchestrator.project_snapshot() {
                    project = snapshot;
                }

                let kind = response.error_kind();
                let ran_tools = !response.tool_calls.is_empty();
                let budget_spent = kind == Some(ChatErrorKind::BudgetExhausted)
                    || response.halted == Some(HaltReason::BudgetExhausted);
                if response.success {
                    report.completed += 1;
                    history.push(HistoryEntry::user(message.clone()));
                    history.push(HistoryEntry::assistant(
                        response.message.clone(),
                        response.tool_calls.clone(),
                    ));
                }
                report.items.push(BatchItem {
                    message: message.clone(),
                    provider,
                    response,
                });

                if budget_spent {
                    info!("batch stopped: action budget exhausted");
                    report.stopped_by_budget = true;
                    break 'messages;
                }

                let retryable = matches!(
                    kind,
                    Some(ChatErrorKind::Transport) | Some(ChatErrorKind::ProviderUnavailable)
                );
                if !(retryable && options.auto_switch_provider) {
                    break;
                }
                // Tools that already ran must not run again on another provider.
                if ran_tools {
                    warn!(provider = %provider, "not retrying: tools already executed");
                    break;
                }

                match self
                    .orchestrator
                    .next_available_provider(provider)
                    .filter(|next| !tried.contains(next))
                {
                    Some(next) => {
                        info!(from = %provider, to = %next, "switching provider after failure");
                        provider = next;
                        tried.push(next);
                    }
                    None => {
                        warn!(provider = %provider, "no other provider to switch to");
                        break;
                    }
                }
            }
        }

        info!(
            iterations = report.iterations,
            completed = report.completed,
            stopped_by_budget = report.stopped_by_budget,
            "batch finished"
        );
        report
    }
}
