//! UI Tool Implementations
//!
//! Thin wrappers over the optional `UiActions` hooks. A hook the application
//! does not provide, or one that fails, surfaces as a soft tool failure.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

use builder_agent_core::ToolContext;
use builder_agent_llm::ParameterSchema;

use crate::executor::{ToolError, ToolOutput};
use crate::trait_def::Tool;

use super::required_str;

const TABS: &[&str] = &["preview", "code", "assets", "plan"];

pub struct SwitchTabTool;

impl SwitchTabTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SwitchTabTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SwitchTabTool {
    fn name(&self) -> &str {
        "switch_tab"
    }

    fn description(&self) -> &str {
        "Switch the editor to another tab so the user can see the result."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "tab".to_string(),
            ParameterSchema::string_enum(Some("Tab to show"), TABS),
        );
        ParameterSchema::object(Some("Tab parameters"), properties, vec!["tab".to_string()])
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let tab = required_str(&args, "tab")?;
        ctx.notify(|ui| ui.switch_tab(tab)).map_err(ToolError::Ui)?;
        Ok(ToolOutput::with_data(
            format!("Switched to the {} tab", tab),
            json!({ "tab": tab }),
        ))
    }
}

pub struct ShowCodeTool;

impl ShowCodeTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShowCodeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ShowCodeTool {
    fn name(&self) -> &str {
        "show_code"
    }

    fn description(&self) -> &str {
        "Open the code view for a component."
    }

    fn parameters_schema(&self) -> ParameterSchema {
        let mut properties = HashMap::new();
        properties.insert(
            "component_id".to_string(),
            ParameterSchema::string(Some("Id of the component to show")),
        );
        ParameterSchema::object(
            Some("Show code parameters"),
            properties,
            vec!["component_id".to_string()],
        )
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let component_id = required_str(&args, "component_id")?;
        if ctx.current_project().component(component_id).is_none() {
            return Err(ToolError::not_found(format!("component {}", component_id)));
        }
        ctx.notify(|ui| ui.show_code(component_id))
            .map_err(ToolError::Ui)?;
        Ok(ToolOutput::with_data(
            format!("Showing code for {}", component_id),
            json!({ "component_id": component_id }),
        ))
    }
}
