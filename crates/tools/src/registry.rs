//! Tool Registry
//!
//! Immutable catalog of callable tools, built once at startup and shared
//! behind an `Arc` by providers (for advertising definitions), the executor
//! (for dispatch), and the orchestrator (for continuation rules).
//!
//! Lookups are pure reads: the table never changes after `build()`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use builder_agent_core::{CoreError, CoreResult};
use builder_agent_llm::ToolDefinition;

use crate::trait_def::Tool;

/// When a continuation rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationCondition {
    Always,
    /// The user's message asked for a UI component
    IfComponentRequested,
    /// The user's message describes a multi-step request that is not done yet
    IfUserIntentComplete,
}

/// Maps a value in the completed tool's result data onto an argument of the
/// next tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgBinding {
    /// JSON pointer into the result `data` (e.g. `/url`)
    pub from: String,
    /// Argument name on the next tool
    pub to: String,
}

/// Declarative follow-up attached to a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationRule {
    pub next_tool: String,
    pub condition: ContinuationCondition,
    /// How many times in a row this rule may fire within one request
    pub max_chain_length: u32,
    #[serde(default)]
    pub carry: Vec<ArgBinding>,
}

impl ContinuationRule {
    /// Rule that always continues once to `next_tool`.
    pub fn new(next_tool: impl Into<String>) -> Self {
        Self {
            next_tool: next_tool.into(),
            condition: ContinuationCondition::Always,
            max_chain_length: 1,
            carry: Vec::new(),
        }
    }

    pub fn when(mut self, condition: ContinuationCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn max_chain(mut self, max_chain_length: u32) -> Self {
        self.max_chain_length = max_chain_length;
        self
    }

    /// Carry `data[from]` into the next tool's `to` argument.
    pub fn carry(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.carry.push(ArgBinding {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Resolve the carried arguments against a result's data.
    ///
    /// Bindings whose pointer does not resolve, or resolves to null, are
    /// skipped.
    pub fn carried_args(&self, data: &Value) -> Map<String, Value> {
        self.carry
            .iter()
            .filter_map(|binding| {
                data.pointer(&binding.from)
                    .filter(|v| !v.is_null())
                    .map(|v| (binding.to.clone(), v.clone()))
            })
            .collect()
    }
}

/// Registry entry: the provider-facing definition plus the continuation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub definition: ToolDefinition,
    pub continuation: Option<ContinuationRule>,
}

impl ToolSpec {
    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

struct Entry {
    spec: ToolSpec,
    tool: Arc<dyn Tool>,
}

/// Registry of available tools.
pub struct ToolRegistry {
    entries: HashMap<String, Entry>,
    /// Insertion order for deterministic iteration
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Look up a tool's spec by name.
    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.entries.get(name).map(|e| &e.spec)
    }

    /// Look up a tool's implementation by name.
    pub fn tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.entries.get(name).map(|e| Arc::clone(&e.tool))
    }

    pub fn continuation_for(&self, name: &str) -> Option<&ContinuationRule> {
        self.get(name).and_then(|spec| spec.continuation.as_ref())
    }

    /// All tool definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.get(name))
            .map(|spec| spec.definition.clone())
            .collect()
    }

    /// All registered tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.order)
            .finish()
    }
}

/// Collects tools and validates the table on `build()`.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    /// Register a tool. A later registration with the same name replaces the
    /// earlier one but keeps its position.
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *slot = tool;
        } else {
            self.tools.push(tool);
        }
        self
    }

    /// Freeze the table.
    ///
    /// Fails when a continuation points at an unregistered tool or allows
    /// zero chain steps.
    pub fn build(self) -> CoreResult<ToolRegistry> {
        let mut entries = HashMap::new();
        let mut order = Vec::with_capacity(self.tools.len());

        for tool in self.tools {
            let spec = ToolSpec {
                definition: tool.definition(),
                continuation: tool.continuation(),
            };
            order.push(spec.name().to_string());
            entries.insert(spec.name().to_string(), Entry { spec, tool });
        }

        for name in &order {
            let Some(rule) = entries.get(name).and_then(|e| e.spec.continuation.as_ref()) else {
                continue;
            };
            if !entries.contains_key(&rule.next_tool) {
                return Err(CoreError::validation(format!(
                    "tool '{}' continues to unknown tool '{}'",
                    name, rule.next_tool
                )));
            }
            if rule.max_chain_length == 0 {
                return Err(CoreError::validation(format!(
                    "tool '{}' has a continuation with max_chain_length 0",
                    name
                )));
            }
        }

        Ok(ToolRegistry { entries, order })
    }
}
