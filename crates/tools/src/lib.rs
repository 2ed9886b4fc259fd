//! Builder Agent Tools
//!
//! The tool side of the orchestration core:
//! - `registry` - immutable tool catalog with declarative continuation rules
//! - `trait_def` - the `Tool` trait and closure-based `FunctionTool`
//! - `executor` - validated, panic-isolated tool dispatch and condition evaluation
//! - `validation` - argument checks against `ParameterSchema`
//! - `collaborators` - interfaces to image/component generators, CDN, screenshots
//! - `impls` / `catalog` - built-in tools and the default registry
//! - `system_prompt` - provider system prompt and continuation instructions

pub mod catalog;
pub mod collaborators;
pub mod executor;
pub mod impls;
pub mod registry;
pub mod system_prompt;
pub mod trait_def;
pub mod validation;

pub use catalog::{default_builder, default_registry};
pub use collaborators::{
    AssetUploader, Collaborators, ComponentGenerator, ComponentRequest, GeneratedComponent,
    GeneratedImage, ImageGenerator, ScreenshotCapture,
};
pub use executor::{
    ExecutorError, ToolCallRecord, ToolCallResult, ToolError, ToolExecutor, ToolOutput,
    MAX_INTENT_STEPS,
};
pub use registry::{
    ArgBinding, ContinuationCondition, ContinuationRule, ToolRegistry, ToolRegistryBuilder,
    ToolSpec,
};
pub use system_prompt::{build_system_prompt, continuation_instruction};
pub use trait_def::{FunctionTool, Tool, ToolFuture};
pub use validation::validate_args;
