//! Tool Context
//!
//! Everything a tool may touch while it runs: the project snapshot that came
//! with the turn, the caller's mutation sink, and the UI hooks.
//!
//! Tools only see `ToolContext`. They cannot reach provider state, the action
//! budget, or the conversation history.

use std::sync::Arc;

use crate::project::{Project, ProjectSink, ProjectUpdater};
use crate::ui::{UiActions, UiHookOutcome};

/// Context for a single tool invocation.
#[derive(Clone)]
pub struct ToolContext {
    session_id: String,
    /// Unique identifier for this specific tool call.
    tool_call_id: String,
    project: Arc<Project>,
    sink: Arc<dyn ProjectSink>,
    ui: Arc<dyn UiActions>,
}

impl ToolContext {
    pub fn new(
        session_id: impl Into<String>,
        project: Arc<Project>,
        sink: Arc<dyn ProjectSink>,
        ui: Arc<dyn UiActions>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            tool_call_id: String::new(),
            project,
            sink,
            ui,
        }
    }

    /// Derive the context for one call.
    pub fn for_call(&self, tool_call_id: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            ..self.clone()
        }
    }

    /// Same context with a newer project snapshot.
    pub fn with_project(&self, project: Arc<Project>) -> Self {
        Self {
            project,
            ..self.clone()
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }

    /// Snapshot of the project as it was when the turn was dispatched.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Latest document the sink will share, falling back to the turn snapshot.
    pub fn current_project(&self) -> Project {
        self.sink
            .snapshot()
            .unwrap_or_else(|| self.project.as_ref().clone())
    }

    /// Apply a mutation through the caller's sink.
    pub fn apply(&self, updater: ProjectUpdater) {
        self.sink.apply(updater);
    }

    pub fn ui(&self) -> &dyn UiActions {
        self.ui.as_ref()
    }

    /// Deliver a UI notification, mapping anything but delivery to an error
    /// message.
    pub fn notify(&self, hook: impl FnOnce(&dyn UiActions) -> UiHookOutcome) -> Result<(), String> {
        match hook(self.ui.as_ref()) {
            UiHookOutcome::Delivered => Ok(()),
            UiHookOutcome::Unsupported => {
                Err("the editor does not support this action".to_string())
            }
            UiHookOutcome::Failed { message } => Err(message),
        }
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("session_id", &self.session_id)
            .field("tool_call_id", &self.tool_call_id)
            .field("project_id", &self.project.id)
            .finish()
    }
}
