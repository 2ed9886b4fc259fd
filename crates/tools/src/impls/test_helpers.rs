//! Shared test utilities for tool unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use builder_agent_core::{
    Component, InMemoryProject, NoUi, Project, ToolContext, UiActions, UiHookOutcome,
};

use crate::collaborators::{
    AssetUploader, ComponentGenerator, ComponentRequest, GeneratedComponent, GeneratedImage,
    ImageGenerator, ScreenshotCapture,
};
use crate::executor::ToolError;

/// Create a `ToolContext` over an in-memory project, returning the sink so
/// tests can inspect mutations.
pub(crate) fn make_test_ctx(project: Project) -> (ToolContext, InMemoryProject) {
    make_test_ctx_with_ui(project, Arc::new(NoUi))
}

pub(crate) fn make_test_ctx_with_ui(
    project: Project,
    ui: Arc<dyn UiActions>,
) -> (ToolContext, InMemoryProject) {
    let sink = InMemoryProject::new(project);
    let ctx = ToolContext::new("test", Arc::new(sink.get()), Arc::new(sink.clone()), ui);
    (ctx.for_call("call_test"), sink)
}

pub(crate) fn component(id: &str, code: &str) -> Component {
    Component {
        id: id.to_string(),
        name: format!("{} name", id),
        description: String::new(),
        code: code.to_string(),
        source_image_url: None,
        revision: 0,
    }
}

pub(crate) fn project_with(components: Vec<Component>) -> Project {
    Project {
        components,
        ..Project::new("Test")
    }
}

/// UI that accepts every hook and records what it was asked to do.
#[derive(Default)]
pub(crate) struct RecordingUi {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingUi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) -> UiHookOutcome {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        UiHookOutcome::Delivered
    }
}

impl UiActions for RecordingUi {
    fn switch_tab(&self, tab: &str) -> UiHookOutcome {
        self.record(format!("switch_tab:{}", tab))
    }

    fn show_code(&self, component_id: &str) -> UiHookOutcome {
        self.record(format!("show_code:{}", component_id))
    }

    fn focus_component(&self, component_id: &str) -> UiHookOutcome {
        self.record(format!("focus_component:{}", component_id))
    }
}

pub(crate) struct StaticImages;

#[async_trait]
impl ImageGenerator for StaticImages {
    async fn generate(&self, prompt: &str, _style: Option<&str>) -> Result<GeneratedImage, ToolError> {
        if prompt.contains("fail") {
            return Err(ToolError::collaborator("image service unavailable"));
        }
        Ok(GeneratedImage {
            url: "data:image/png;base64,AAAA".to_string(),
            mime_type: Some("image/png".to_string()),
        })
    }
}

pub(crate) struct EchoComponents;

#[async_trait]
impl ComponentGenerator for EchoComponents {
    async fn generate(&self, request: ComponentRequest) -> Result<GeneratedComponent, ToolError> {
        let image = request.image_url.unwrap_or_default();
        Ok(GeneratedComponent {
            name: request.name.clone(),
            code: format!(
                "export default function {}() {{ return <div data-image=\"{}\">{}</div>; }}",
                request.name.replace(' ', ""),
                image,
                request.description
            ),
        })
    }

    async fn edit(&self, component: &Component, instructions: &str) -> Result<String, ToolError> {
        Ok(format!("{}\n// {}", component.code, instructions))
    }
}

pub(crate) struct PrefixUploader;

#[async_trait]
impl AssetUploader for PrefixUploader {
    async fn upload(&self, _source: &str, file_name: &str) -> Result<String, ToolError> {
        Ok(format!("https://cdn.example.com/{}", file_name))
    }
}

pub(crate) struct FakeScreenshots;

#[async_trait]
impl ScreenshotCapture for FakeScreenshots {
    async fn capture(&self, component: &Component) -> Result<String, ToolError> {
        Ok(format!("https://shots.example.com/{}.png", component.id))
    }
}
