//! Component Tool Implementations
//!
//! `generate_component` and `edit_component` delegate code generation to the
//! application's `ComponentGenerator`. `reflect_on_component` is a built-in
//! review pass over the stored code, optionally backed by a screenshot.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use builder_agent_core::{new_id, Asset, AssetKind, Component, ToolContext};
use builder_agent_llm::ParameterSchema;

use crate::collaborators::{ComponentGenerator, ComponentRequest, ScreenshotCapture};
use crate::executor::{ToolError, ToolOutput};
use crate::registry::{ContinuationCondition, ContinuationRule};
use crate::trait_def::Tool;

use super::{optional_str, required_str};

/// Lines longer than this are flagged by the review.
const MAX_LINE_LENGTH: usize = 160;

fn component_id_schema() -> ParameterSchema {
    ParameterSchema::string(Some("Id of an existing component, e.g. 'comp-1a2b3c4d5e6f'"))
}

// ── generate_component ────────────────────────────────────────────────

pub struct GenerateComponentTool {
    generator: Arc<dyn ComponentGenerator>,
}

impl GenerateComponentTool {
    pub fn new(generator: Arc<dyn ComponentGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Tool for GenerateComponentTool {
    fn name(&self) -> &str {
        "generate_component"
    }

    fn description(&self) -> &str {
        "Generate a new UI component from a description, optionally based on a reference image, and add it to the project."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "name".to_string(),
            ParameterSchema::string(Some("Short component name, e.g. 'Pricing Card'")),
        );
        properties.insert(
            "description".to_string(),
            ParameterSchema::string(Some("What the component shows and how it behaves")),
        );
        properties.insert(
            "image_url".to_string(),
            ParameterSchema::string(Some("Optional reference image URL from a generated asset")),
        );
        ParameterSchema::object(
            Some("Component generation parameters"),
            properties,
            vec!["name".to_string(), "description".to_string()],
        )
    }

    fn continuation(&self) -> Option<ContinuationRule> {
        Some(
            ContinuationRule::new("reflect_on_component")
                .when(ContinuationCondition::Always)
                .max_chain(1)
                .carry("/component_id", "component_id"),
        )
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let name = required_str(&args, "name")?;
        let description = required_str(&args, "description")?;
        let image_url = optional_str(&args, "image_url").map(str::to_string);

        let generated = self
            .generator
            .generate(ComponentRequest {
                name: name.to_string(),
                description: description.to_string(),
                image_url: image_url.clone(),
                project_summary: ctx.project().summary(),
            })
            .await?;

        let component = Component {
            id: new_id("comp"),
            name: generated.name,
            description: description.to_string(),
            code: generated.code,
            source_image_url: image_url,
            revision: 0,
        };
        let component_id = component.id.clone();
        let component_name = component.name.clone();
        let code_lines = component.code.lines().count();

        ctx.apply(Box::new(move |mut project| {
            project.components.push(component);
            project
        }));

        // Focusing the new component is a courtesy; headless callers lack it.
        if let Err(reason) = ctx.notify(|ui| ui.focus_component(&component_id)) {
            tracing::debug!(component_id = %component_id, "focus_component not delivered: {}", reason);
        }

        Ok(ToolOutput::with_data(
            format!("Created component '{}' ({})", component_name, component_id),
            json!({
                "component_id": component_id,
                "name": component_name,
                "lines": code_lines,
            }),
        ))
    }
}

// ── edit_component ────────────────────────────────────────────────────

pub struct EditComponentTool {
    generator: Arc<dyn ComponentGenerator>,
}

impl EditComponentTool {
    pub fn new(generator: Arc<dyn ComponentGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Tool for EditComponentTool {
    fn name(&self) -> &str {
        "edit_component"
    }

    fn description(&self) -> &str {
        "Modify an existing component according to instructions. The component's code is replaced with the edited version."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert("component_id".to_string(), component_id_schema());
        properties.insert(
            "instructions".to_string(),
            ParameterSchema::string(Some("What to change, e.g. 'make the button rounded and blue'")),
        );
        ParameterSchema::object(
            Some("Component edit parameters"),
            properties,
            vec!["component_id".to_string(), "instructions".to_string()],
        )
    }

    fn continuation(&self) -> Option<ContinuationRule> {
        Some(
            ContinuationRule::new("reflect_on_component")
                .when(ContinuationCondition::IfUserIntentComplete)
                .max_chain(1)
                .carry("/component_id", "component_id"),
        )
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let component_id = required_str(&args, "component_id")?;
        let instructions = required_str(&args, "instructions")?;

        let current = ctx.current_project();
        let component = current
            .component(component_id)
            .ok_or_else(|| ToolError::not_found(format!("component {}", component_id)))?;

        let code = self.generator.edit(component, instructions).await?;
        let revision = component.revision + 1;

        let id = component_id.to_string();
        ctx.apply(Box::new(move |mut project| {
            if let Some(component) = project.component_mut(&id) {
                component.code = code;
                component.revision = revision;
            }
            project
        }));

        Ok(ToolOutput::with_data(
            format!("Edited component {} (revision {})", component_id, revision),
            json!({ "component_id": component_id, "revision": revision }),
        ))
    }
}

// ── reflect_on_component ──────────────────────────────────────────────

pub struct ReflectOnComponentTool {
    screenshots: Option<Arc<dyn ScreenshotCapture>>,
}

impl ReflectOnComponentTool {
    pub fn new() -> Self {
        Self { screenshots: None }
    }

    pub fn with_screenshots(mut self, screenshots: Arc<dyn ScreenshotCapture>) -> Self {
        self.screenshots = Some(screenshots);
        self
    }
}

impl Default for ReflectOnComponentTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Static checks over generated component code.
fn review_code(code: &str) -> Vec<String> {
    let mut issues = Vec::new();

    if code.trim().is_empty() {
        issues.push("component has no code".to_string());
        return issues;
    }
    if !code.contains("export") {
        issues.push("component is not exported".to_string());
    }
    if code.contains("<img") && !code.contains("alt=") {
        issues.push("images are missing alt text".to_string());
    }
    if code.contains("onClick") && !code.contains("<button") && !code.contains("role=") {
        issues.push("clickable element without a button role".to_string());
    }
    let inline_styles = code.matches("style={{").count();
    if inline_styles > 3 {
        issues.push(format!("{} inline style objects; prefer classes", inline_styles));
    }
    let long_lines = code.lines().filter(|l| l.len() > MAX_LINE_LENGTH).count();
    if long_lines > 0 {
        issues.push(format!(
            "{} line(s) longer than {} characters",
            long_lines, MAX_LINE_LENGTH
        ));
    }
    if code.contains("TODO") {
        issues.push("code contains TODO markers".to_string());
    }

    issues
}

#[async_trait]
impl Tool for ReflectOnComponentTool {
    fn name(&self) -> &str {
        "reflect_on_component"
    }

    fn description(&self) -> &str {
        "Review a component's code for common problems (accessibility, structure, styling) and report what should be improved."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert("component_id".to_string(), component_id_schema());
        properties.insert(
            "focus".to_string(),
            ParameterSchema::string(Some("Optional aspect to concentrate on, e.g. 'accessibility'")),
        );
        ParameterSchema::object(
            Some("Component review parameters"),
            properties,
            vec!["component_id".to_string()],
        )
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let component_id = required_str(&args, "component_id")?;
        let focus = optional_str(&args, "focus");

        let current = ctx.current_project();
        let component = current
            .component(component_id)
            .ok_or_else(|| ToolError::not_found(format!("component {}", component_id)))?;

        let mut issues = review_code(&component.code);
        if let Some(focus) = focus {
            let focus = focus.to_lowercase();
            let focused: Vec<String> = issues
                .iter()
                .filter(|issue| issue.contains(&focus))
                .cloned()
                .collect();
            if !focused.is_empty() {
                issues = focused;
            }
        }

        let screenshot_url = match &self.screenshots {
            Some(capture) => match capture.capture(component).await {
                Ok(url) => {
                    let asset = Asset {
                        id: new_id("asset"),
                        kind: AssetKind::Screenshot,
                        url: url.clone(),
                        prompt: None,
                    };
                    ctx.apply(Box::new(move |mut project| {
                        project.assets.push(asset);
                        project
                    }));
                    Some(url)
                }
                Err(err) => {
                    // Review still stands on the code alone.
                    tracing::warn!(component_id, "screenshot for review failed: {}", err);
                    None
                }
            },
            None => None,
        };

        let summary = if issues.is_empty() {
            format!("Reviewed {}: no issues found", component_id)
        } else {
            format!("Reviewed {}: {} issue(s) found", component_id, issues.len())
        };

        Ok(ToolOutput::with_data(
            summary,
            json!({
                "component_id": component_id,
                "revision": component.revision,
                "issues": issues,
                "screenshot_url": screenshot_url,
            }),
        ))
    }
}
