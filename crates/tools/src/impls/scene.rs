//! CreateScene Tool Implementation

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

use builder_agent_core::{new_id, Scene, ToolContext};
use builder_agent_llm::ParameterSchema;

use crate::executor::{ToolError, ToolOutput};
use crate::trait_def::Tool;

use super::required_str;

/// Groups existing components into a named scene for preview.
pub struct CreateSceneTool;

impl CreateSceneTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CreateSceneTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CreateSceneTool {
    fn name(&self) -> &str {
        "create_scene"
    }

    fn description(&self) -> &str {
        "Create a scene that arranges existing components (in order) for preview. The new scene becomes active unless activate is false."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "name".to_string(),
            ParameterSchema::string(Some("Scene name, e.g. 'Home page'")),
        );
        properties.insert(
            "component_ids".to_string(),
            ParameterSchema::array(
                Some("Ids of components to include, top to bottom"),
                ParameterSchema::string(None),
            ),
        );
        properties.insert(
            "activate".to_string(),
            ParameterSchema::boolean(Some("Make this the active scene (default true)"))
                .with_default(json!(true)),
        );
        ParameterSchema::object(
            Some("Scene parameters"),
            properties,
            vec!["name".to_string()],
        )
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let name = required_str(&args, "name")?;
        let activate = args["activate"].as_bool().unwrap_or(true);
        let component_ids: Vec<String> = args["component_ids"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect();

        let current = ctx.current_project();
        let missing: Vec<&str> = component_ids
            .iter()
            .map(String::as_str)
            .filter(|id| current.component(id).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ToolError::not_found(format!(
                "component(s) {}",
                missing.join(", ")
            )));
        }

        let scene = Scene {
            id: new_id("scene"),
            name: name.to_string(),
            component_ids,
        };
        let scene_id = scene.id.clone();
        let count = scene.component_ids.len();

        let active_id = scene_id.clone();
        ctx.apply(Box::new(move |mut project| {
            project.scenes.push(scene);
            if activate {
                project.active_scene = Some(active_id);
            }
            project
        }));

        Ok(ToolOutput::with_data(
            format!("Created scene '{}' with {} component(s)", name, count),
            json!({ "scene_id": scene_id, "active": activate }),
        ))
    }
}
