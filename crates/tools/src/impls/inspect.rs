//! GetProjectState Tool Implementation
//!
//! Read-only view of the project for the model. Component code is omitted
//! unless asked for, since it dominates the payload.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

use builder_agent_core::ToolContext;
use builder_agent_llm::ParameterSchema;

use crate::executor::{ToolError, ToolOutput};
use crate::trait_def::Tool;

use super::optional_str;

pub struct GetProjectStateTool;

impl GetProjectStateTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GetProjectStateTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for GetProjectStateTool {
    fn name(&self) -> &str {
        "get_project_state"
    }

    fn description(&self) -> &str {
        "Inspect the current project: components, assets, plans, and scenes. Pass component_id to get one component including its code."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "component_id".to_string(),
            ParameterSchema::string(Some("Return only this component, with code")),
        );
        properties.insert(
            "include_code".to_string(),
            ParameterSchema::boolean(Some("Include component code in the full listing (default false)")),
        );
        ParameterSchema::object(Some("Inspection parameters"), properties, vec![])
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let project = ctx.current_project();

        if let Some(component_id) = optional_str(&args, "component_id") {
            let component = project
                .component(component_id)
                .ok_or_else(|| ToolError::not_found(format!("component {}", component_id)))?;
            let data = serde_json::to_value(component)
                .map_err(|e| ToolError::Failed(e.to_string()))?;
            return Ok(ToolOutput::with_data(
                format!("Component {} \"{}\"", component.id, component.name),
                data,
            ));
        }

        let include_code = args["include_code"].as_bool().unwrap_or(false);
        let components: Vec<Value> = project
            .components
            .iter()
            .map(|c| {
                let mut entry = json!({
                    "id": c.id,
                    "name": c.name,
                    "description": c.description,
                    "revision": c.revision,
                    "lines": c.code.lines().count(),
                });
                if include_code {
                    entry["code"] = json!(c.code);
                }
                entry
            })
            .collect();

        Ok(ToolOutput::with_data(
            project.summary(),
            json!({
                "id": project.id,
                "name": project.name,
                "components": components,
                "assets": project.assets,
                "plans": project.plans,
                "scenes": project.scenes,
                "active_scene": project.active_scene,
            }),
        ))
    }
}
