//! Shared fixtures: a scripted provider that records every request, small
//! function tools, and collaborator fakes for the default catalog.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use builder_agent::{Orchestrator, OrchestratorConfig, ProviderSet};
use builder_agent_core::{Component, InMemoryProject, Project};
use builder_agent_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageContent,
    ParameterSchema, ProviderConfig, ProviderType, StopReason, ToolCall, ToolDefinition,
    UsageStats,
};
use builder_agent_tools::{
    ComponentGenerator, ComponentRequest, ContinuationRule, FunctionTool, GeneratedComponent,
    GeneratedImage, ImageGenerator, Tool, ToolError, ToolOutput, ToolRegistry,
};

// ============================================================================
// Mock provider
// ============================================================================

/// One request as the provider received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub system: Option<String>,
    pub tools: Vec<String>,
    pub options: LlmRequestOptions,
}

impl RecordedRequest {
    /// Tool results carried by the last message.
    pub fn tool_results(&self) -> Vec<(String, String, bool)> {
        self.messages
            .last()
            .map(|m| {
                m.content
                    .iter()
                    .filter_map(|c| match c {
                        MessageContent::ToolResult {
                            tool_use_id,
                            content,
                            is_error,
                        } => Some((tool_use_id.clone(), content.clone(), is_error.unwrap_or(false))),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Provider that replays scripted responses in order. Once the script runs
/// out it answers with plain text.
pub struct MockProvider {
    config: ProviderConfig,
    forced_choice: bool,
    responses: Mutex<Vec<LlmResult<LlmResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockProvider {
    pub fn new(provider: ProviderType, responses: Vec<LlmResult<LlmResponse>>) -> Self {
        Self {
            config: ProviderConfig {
                api_key: Some("test-key".to_string()),
                ..ProviderConfig::for_provider(provider)
            },
            forced_choice: true,
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Backend whose API cannot be told to call one specific tool.
    pub fn without_forced_choice(mut self) -> Self {
        self.forced_choice = false;
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn provider_type(&self) -> ProviderType {
        self.config.provider
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn supports_tools(&self) -> bool {
        true
    }

    fn supports_forced_tool_choice(&self) -> bool {
        self.forced_choice
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages,
            system,
            tools: tools.into_iter().map(|t| t.name).collect(),
            options: request_options,
        });

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            text("Done.")
        } else {
            responses.remove(0)
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

static CALL_SEQ: AtomicUsize = AtomicUsize::new(0);

/// A plain text answer.
pub fn text(content: &str) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: Some(content.to_string()),
        tool_calls: vec![],
        stop_reason: StopReason::EndTurn,
        usage: UsageStats {
            input_tokens: 10,
            output_tokens: 5,
        },
        model: "mock-model".to_string(),
    })
}

/// An answer requesting the given tool calls, in order.
pub fn tool_use(calls: &[(&str, Value)]) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: None,
        tool_calls: calls
            .iter()
            .map(|(name, args)| ToolCall {
                id: format!("toolu_{}", CALL_SEQ.fetch_add(1, Ordering::SeqCst)),
                name: name.to_string(),
                arguments: args.clone(),
            })
            .collect(),
        stop_reason: StopReason::ToolUse,
        usage: UsageStats {
            input_tokens: 20,
            output_tokens: 8,
        },
        model: "mock-model".to_string(),
    })
}

pub fn network_error() -> LlmResult<LlmResponse> {
    Err(LlmError::NetworkError {
        message: "connection reset".to_string(),
    })
}

// ============================================================================
// Tools
// ============================================================================

fn object(fields: &[&str], required: &[&str]) -> ParameterSchema {
    let properties: HashMap<String, ParameterSchema> = fields
        .iter()
        .map(|f| (f.to_string(), ParameterSchema::string(None)))
        .collect();
    ParameterSchema::object(None, properties, required.iter().map(|r| r.to_string()).collect())
}

/// `generate_image`: fails when the prompt mentions "fail".
pub fn image_tool() -> FunctionTool {
    FunctionTool::new(
        "generate_image",
        "Generate an image from a prompt",
        object(&["prompt"], &["prompt"]),
        |_ctx, args| {
            Box::pin(async move {
                let prompt = args["prompt"].as_str().unwrap_or_default().to_string();
                if prompt.contains("fail") {
                    return Err(ToolError::collaborator("image service unavailable"));
                }
                Ok(ToolOutput::with_data(
                    "Generated image asset-1",
                    json!({"asset_id": "asset-1", "url": "https://cdn.example.com/asset-1.png"}),
                ))
            })
        },
    )
}

/// `reflect`: echoes its arguments.
pub fn reflect_tool() -> FunctionTool {
    FunctionTool::new(
        "reflect",
        "Review the latest artifact",
        object(&["image_url"], &[]),
        |_ctx, args| Box::pin(async move { Ok(ToolOutput::with_data("Reviewed", args)) }),
    )
}

/// A tool that does nothing and has no continuation.
pub fn noop_tool(name: &str) -> FunctionTool {
    FunctionTool::new(name, "Does nothing", object(&[], &[]), |_ctx, _args| {
        Box::pin(async move { Ok(ToolOutput::message("ok")) })
    })
}

/// `generate_image` chaining to `reflect` unconditionally.
pub fn image_then_reflect(max_chain: u32) -> Arc<ToolRegistry> {
    let image = image_tool()
        .with_continuation(ContinuationRule::new("reflect").max_chain(max_chain).carry("/url", "image_url"));
    Arc::new(
        ToolRegistry::builder()
            .register(Arc::new(image))
            .register(Arc::new(reflect_tool()))
            .register(Arc::new(noop_tool("get_status")))
            .build()
            .unwrap(),
    )
}

/// `ping` and `pong` pointing at each other.
pub fn ping_pong(max_chain: u32) -> Arc<ToolRegistry> {
    let ping = noop_tool("ping").with_continuation(ContinuationRule::new("pong").max_chain(max_chain));
    let pong = noop_tool("pong").with_continuation(ContinuationRule::new("ping").max_chain(max_chain));
    let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(ping), Arc::new(pong)];
    let mut builder = ToolRegistry::builder();
    for tool in tools {
        builder = builder.register(tool);
    }
    Arc::new(builder.build().unwrap())
}

// ============================================================================
// Collaborators for the default catalog
// ============================================================================

pub struct FakeImages;

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(&self, prompt: &str, _style: Option<&str>) -> Result<GeneratedImage, ToolError> {
        Ok(GeneratedImage {
            url: format!("https://images.example.com/{}.png", prompt.split_whitespace().count()),
            mime_type: Some("image/png".to_string()),
        })
    }
}

pub struct FakeComponents;

#[async_trait]
impl ComponentGenerator for FakeComponents {
    async fn generate(&self, request: ComponentRequest) -> Result<GeneratedComponent, ToolError> {
        let image = request
            .image_url
            .map(|url| format!("<img src=\"{}\" alt=\"{}\" />", url, request.name))
            .unwrap_or_default();
        Ok(GeneratedComponent {
            name: request.name,
            code: format!("<section>\n  {}\n  <h2>{}</h2>\n</section>", image, request.description),
        })
    }

    async fn edit(&self, component: &Component, instructions: &str) -> Result<String, ToolError> {
        Ok(format!("{}\n<!-- {} -->", component.code, instructions))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub sink: InMemoryProject,
}

pub fn harness(
    registry: Arc<ToolRegistry>,
    providers: Vec<Arc<MockProvider>>,
    config: OrchestratorConfig,
) -> Harness {
    harness_with_project(registry, providers, config, Project::new("Test Project"))
}

pub fn harness_with_project(
    registry: Arc<ToolRegistry>,
    providers: Vec<Arc<MockProvider>>,
    config: OrchestratorConfig,
    project: Project,
) -> Harness {
    let mut set = ProviderSet::new();
    for provider in providers {
        set.insert(provider);
    }
    if let Some(first) = set.available().first().copied() {
        set.set_current(first);
    }
    let sink = InMemoryProject::new(project);
    let orchestrator = Orchestrator::new(registry, set, Arc::new(sink.clone()), config);
    Harness { orchestrator, sink }
}

pub fn budget(limit: u32) -> OrchestratorConfig {
    OrchestratorConfig {
        action_budget: limit,
        ..Default::default()
    }
}
