//! Built-in Tool Implementations
//!
//! Each tool is a struct implementing the `Tool` trait. Tools that depend on
//! an external collaborator hold it as an `Arc<dyn ...>`; the rest only touch
//! the project through `ToolContext`.

pub mod component;
pub mod image;
pub mod inspect;
pub mod plan;
pub mod scene;
pub mod screenshot;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use component::{EditComponentTool, GenerateComponentTool, ReflectOnComponentTool};
pub use image::GenerateImageTool;
pub use inspect::GetProjectStateTool;
pub use plan::{CreatePlanTool, UpdatePlanStepTool};
pub use scene::CreateSceneTool;
pub use screenshot::CaptureScreenshotTool;
pub use ui::{ShowCodeTool, SwitchTabTool};

use serde_json::Value;

use crate::executor::ToolError;

/// Read a required string argument. Empty strings count as missing.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::invalid_args(format!("missing required parameter: {}", key)))
}

/// Read an optional, non-empty string argument.
pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
