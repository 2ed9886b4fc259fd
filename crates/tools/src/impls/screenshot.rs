//! CaptureScreenshot Tool Implementation

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use builder_agent_core::{new_id, Asset, AssetKind, ToolContext};
use builder_agent_llm::ParameterSchema;

use crate::collaborators::ScreenshotCapture;
use crate::executor::{ToolError, ToolOutput};
use crate::trait_def::Tool;

use super::required_str;

/// Renders a component and stores the screenshot as an asset.
pub struct CaptureScreenshotTool {
    capture: Arc<dyn ScreenshotCapture>,
}

impl CaptureScreenshotTool {
    pub fn new(capture: Arc<dyn ScreenshotCapture>) -> Self {
        Self { capture }
    }
}

#[async_trait]
impl Tool for CaptureScreenshotTool {
    fn name(&self) -> &str {
        "capture_screenshot"
    }

    fn description(&self) -> &str {
        "Render a component and save a screenshot of it to the project's assets."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "component_id".to_string(),
            ParameterSchema::string(Some("Id of the component to capture")),
        );
        ParameterSchema::object(
            Some("Screenshot parameters"),
            properties,
            vec!["component_id".to_string()],
        )
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let component_id = required_str(&args, "component_id")?;
        let current = ctx.current_project();
        let component = current
            .component(component_id)
            .ok_or_else(|| ToolError::not_found(format!("component {}", component_id)))?;

        let url = self.capture.capture(component).await?;
        let asset_id = new_id("asset");
        let asset = Asset {
            id: asset_id.clone(),
            kind: AssetKind::Screenshot,
            url: url.clone(),
            prompt: None,
        };
        ctx.apply(Box::new(move |mut project| {
            project.assets.push(asset);
            project
        }));

        Ok(ToolOutput::with_data(
            format!("Captured screenshot of {}", component_id),
            json!({ "asset_id": asset_id, "url": url, "component_id": component_id }),
        ))
    }
}
