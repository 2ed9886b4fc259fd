//! Default Tool Catalog
//!
//! Assembles the built-in tools into a registry. Tools that need a
//! collaborator are registered only when the application supplies it, and
//! continuation rules only point at tools that made it into the table.

use std::sync::Arc;

use builder_agent_core::CoreResult;

use crate::collaborators::Collaborators;
use crate::impls::{
    CaptureScreenshotTool, CreatePlanTool, CreateSceneTool, EditComponentTool,
    GenerateComponentTool, GenerateImageTool, GetProjectStateTool, ReflectOnComponentTool,
    ShowCodeTool, SwitchTabTool, UpdatePlanStepTool,
};
use crate::registry::{ToolRegistry, ToolRegistryBuilder};

/// Builder pre-loaded with the built-in tools. Applications can register
/// their own tools on top before calling `build()`.
pub fn default_builder(collaborators: &Collaborators) -> ToolRegistryBuilder {
    let mut builder = ToolRegistry::builder();

    if let Some(images) = &collaborators.images {
        let mut tool = GenerateImageTool::new(Arc::clone(images));
        if let Some(uploader) = &collaborators.uploader {
            tool = tool.with_uploader(Arc::clone(uploader));
        }
        if collaborators.components.is_some() {
            tool = tool.chaining_to_component();
        }
        builder = builder.register(Arc::new(tool));
    }

    if let Some(generator) = &collaborators.components {
        builder = builder
            .register(Arc::new(GenerateComponentTool::new(Arc::clone(generator))))
            .register(Arc::new(EditComponentTool::new(Arc::clone(generator))));
    }

    let mut reflect = ReflectOnComponentTool::new();
    if let Some(screenshots) = &collaborators.screenshots {
        reflect = reflect.with_screenshots(Arc::clone(screenshots));
    }
    builder = builder.register(Arc::new(reflect));

    if let Some(screenshots) = &collaborators.screenshots {
        builder = builder.register(Arc::new(CaptureScreenshotTool::new(Arc::clone(screenshots))));
    }

    builder
        .register(Arc::new(CreatePlanTool::new()))
        .register(Arc::new(UpdatePlanStepTool::new()))
        .register(Arc::new(CreateSceneTool::new()))
        .register(Arc::new(GetProjectStateTool::new()))
        .register(Arc::new(SwitchTabTool::new()))
        .register(Arc::new(ShowCodeTool::new()))
}

/// Registry with every built-in tool the collaborators allow.
pub fn default_registry(collaborators: &Collaborators) -> CoreResult<ToolRegistry> {
    default_builder(collaborators).build()
}
