//! Provider Adapter
//!
//! Runs one turn against one backend:
//!
//! 1. Build the native conversation from the turn's history and message,
//!    with a system prompt describing the tools and the project.
//! 2. Ask the backend, forcing (or, where the API cannot force, strongly
//!    biasing) the continuation tool when the turn carries one.
//! 3. Execute the requested tools in call order, up to the caller's
//!    allowance.
//! 4. If any tool ran, send exactly one follow-up round with the results so
//!    the model can summarize them.
//!
//! Nothing here returns an error: transport failures become a
//! `success: false` response with an apology.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use builder_agent_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, Message, MessageContent, ToolCall,
    ToolCallMode,
};
use builder_agent_tools::{
    build_system_prompt, continuation_instruction, ExecutorError, ToolCallRecord, ToolCallResult,
    ToolExecutor,
};

use crate::conversation::{ChatErrorKind, ChatResponse, ChatTurn, HistoryEntry, HistoryRole};

/// Result content for calls beyond the allowance.
const SKIPPED_CONTENT: &str = "Skipped: the action budget is exhausted.";

pub struct ProviderAdapter {
    provider: Arc<dyn LlmProvider>,
}

impl ProviderAdapter {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Run one turn. At most `allowance` tools execute.
    pub async fn chat(&self, turn: &ChatTurn, executor: &ToolExecutor, allowance: usize) -> ChatResponse {
        let provider_id = self.provider.provider_type();
        let tools = if self.provider.supports_tools() {
            executor.registry().definitions()
        } else {
            Vec::new()
        };

        let forced_tool = turn
            .forced_tool()
            .filter(|name| tools.iter().any(|t| t.name == *name));
        if let (Some(requested), None) = (turn.forced_tool(), forced_tool) {
            warn!(provider = %provider_id, tool = requested, "cannot force unavailable tool");
        }

        let native_forcing = self.provider.supports_forced_tool_choice();
        let mut system = build_system_prompt(&turn.project, &tools);
        let options = match forced_tool {
            Some(tool) => {
                let args = turn
                    .context
                    .as_ref()
                    .map(|c| c.continuation_args.clone())
                    .unwrap_or_default();
                system.push_str(&continuation_instruction(tool, &args, native_forcing));
                if native_forcing {
                    LlmRequestOptions::forcing(tool)
                } else {
                    LlmRequestOptions::with_mode(ToolCallMode::Required)
                }
            }
            None => LlmRequestOptions::default(),
        };

        let mut messages = history_to_messages(&turn.history);
        messages.push(Message::user(turn.message.clone()));

        debug!(
            provider = %provider_id,
            messages = messages.len(),
            tools = tools.len(),
            forced = forced_tool.unwrap_or(""),
            "sending turn"
        );

        let first = match self
            .provider
            .send_message(messages.clone(), Some(system.clone()), tools.clone(), options)
            .await
        {
            Ok(response) => response,
            Err(e) => return self.transport_failure(&e, Vec::new()),
        };

        let mut usage = first.usage.clone();
        if first.tool_calls.is_empty() {
            let mut response = ChatResponse::ok(first.content.unwrap_or_default(), provider_id);
            response.usage = usage;
            return response;
        }

        let (records, results) = match self
            .run_tools(turn, &first.tool_calls, executor, allowance)
            .await
        {
            Ok(outcome) => outcome,
            Err((ExecutorError::UnknownTool(name), records)) => {
                warn!(provider = %provider_id, tool = %name, "backend requested an unknown tool");
                let mut response = ChatResponse::failure(
                    ChatErrorKind::UnknownTool,
                    format!("The assistant tried to use a tool that does not exist: {}", name),
                );
                response.tool_calls = records;
                response.provider = Some(provider_id);
                response.usage = usage;
                return response;
            }
        };

        if records.is_empty() {
            let mut response = ChatResponse::ok(first.content.unwrap_or_default(), provider_id);
            response.usage = usage;
            return response;
        }

        info!(provider = %provider_id, executed = records.len(), "tools executed, requesting summary");

        messages.push(Message::assistant_tool_use(
            first.content.as_deref(),
            &first.tool_calls,
        ));
        messages.push(Message::tool_results(results));

        let follow_up = self
            .provider
            .send_message(
                messages,
                Some(system),
                tools,
                LlmRequestOptions::with_mode(ToolCallMode::None),
            )
            .await;

        match follow_up {
            Ok(summary) => {
                usage.accumulate(&summary.usage);
                let message = summary_text(&first, &summary, &records);
                ChatResponse {
                    message,
                    tool_calls: records,
                    success: true,
                    error: None,
                    provider: Some(provider_id),
                    usage,
                    halted: None,
                }
            }
            Err(e) => {
                let mut response = self.transport_failure(&e, records);
                response.usage = usage;
                response
            }
        }
    }

    /// Execute requested calls in order. Returns the records of calls that
    /// ran plus one tool-result block per requested call.
    async fn run_tools(
        &self,
        turn: &ChatTurn,
        calls: &[ToolCall],
        executor: &ToolExecutor,
        allowance: usize,
    ) -> Result<(Vec<ToolCallRecord>, Vec<MessageContent>), (ExecutorError, Vec<ToolCallRecord>)> {
        let mut records = Vec::new();
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            if records.len() >= allowance {
                debug!(tool = %call.name, "skipping call beyond allowance");
                results.push(MessageContent::tool_result(&call.id, SKIPPED_CONTENT, true));
                continue;
            }

            let args = merge_continuation_args(turn, &call.name, call.arguments.clone());
            let result: ToolCallResult = match executor.execute_call(&call.id, &call.name, args.clone()).await {
                Ok(result) => result,
                Err(e) => return Err((e, records)),
            };

            results.push(MessageContent::tool_result(
                &call.id,
                result.to_content(),
                !result.success,
            ));
            records.push(ToolCallRecord {
                id: call.id.clone(),
                function: call.name.clone(),
                args,
                result,
            });
        }

        Ok((records, results))
    }

    fn transport_failure(&self, error: &LlmError, records: Vec<ToolCallRecord>) -> ChatResponse {
        let provider_id = self.provider.provider_type();
        warn!(provider = %provider_id, "provider request failed: {}", error);
        let mut response = ChatResponse::failure(
            ChatErrorKind::Transport,
            format!(
                "Sorry, I couldn't get a response from {} right now. Please try again. ({})",
                provider_id, error
            ),
        );
        response.tool_calls = records;
        response.provider = Some(provider_id);
        response
    }
}

/// Fill continuation arguments the model left out of the forced call.
fn merge_continuation_args(turn: &ChatTurn, tool: &str, args: Value) -> Value {
    let Some(context) = turn.context.as_ref() else {
        return args;
    };
    if context.forced_tool() != Some(tool) || context.continuation_args.is_empty() {
        return args;
    }

    let mut merged = match args {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => return other,
    };
    for (key, value) in &context.continuation_args {
        let missing = merged.get(key).map(Value::is_null).unwrap_or(true);
        if missing {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

/// Final message text: the summary round's text, falling back to the first
/// round's text and then the tool summaries.
fn summary_text(first: &LlmResponse, summary: &LlmResponse, records: &[ToolCallRecord]) -> String {
    summary
        .content
        .clone()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| first.content.clone().filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| {
            records
                .iter()
                .map(|r| r.result.summary.clone())
                .collect::<Vec<_>>()
                .join("\n")
        })
}

/// Convert conversation history into provider-neutral messages.
///
/// An assistant entry with tool calls becomes the tool-use message, the
/// results, and then the assistant's text, so every backend sees matched
/// tool-use/result pairs.
pub fn history_to_messages(history: &[HistoryEntry]) -> Vec<Message> {
    let mut messages = Vec::new();

    for entry in history {
        match entry.role {
            HistoryRole::User => messages.push(Message::user(entry.content.clone())),
            HistoryRole::Assistant if entry.tool_calls.is_empty() => {
                messages.push(Message::assistant(entry.content.clone()));
            }
            HistoryRole::Assistant => {
                let calls: Vec<ToolCall> = entry
                    .tool_calls
                    .iter()
                    .map(|r| ToolCall {
                        id: r.id.clone(),
                        name: r.function.clone(),
                        arguments: r.args.clone(),
                    })
                    .collect();
                messages.push(Message::assistant_tool_use(None, &calls));
                messages.push(Message::tool_results(
                    entry
                        .tool_calls
                        .iter()
                        .map(|r| {
                            MessageContent::tool_result(&r.id, r.result.to_content(), !r.result.success)
                        })
                        .collect(),
                ));

                let text = if entry.content.trim().is_empty() {
                    entry
                        .tool_calls
                        .iter()
                        .map(|r| r.result.summary.clone())
                        .collect::<Vec<_>>()
                        .join("\n")
                } else {
                    entry.content.clone()
                };
                messages.push(Message::assistant(text));
            }
        }
    }

    messages
}
