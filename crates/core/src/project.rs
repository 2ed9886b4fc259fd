//! Project Document
//!
//! The project is the mutable document the building agent works on:
//! generated components, image assets, work plans, and scenes that group
//! components for preview.
//!
//! The orchestration core never owns the document. It reads the snapshot
//! that arrives with each turn and writes through a [`ProjectSink`] supplied
//! by the caller, so the caller keeps authority over persistence and
//! concurrency.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// A generated UI component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Generated source code for the component
    #[serde(default)]
    pub code: String,
    /// Image the component was generated from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_image_url: Option<String>,
    /// Number of edits applied since generation
    #[serde(default)]
    pub revision: u32,
}

/// Kind of a stored asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Screenshot,
}

/// A binary asset referenced by URL (CDN or data URI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub kind: AssetKind,
    pub url: String,
    /// Prompt the asset was generated from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Status of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    Skipped,
}

impl StepStatus {
    /// Parse a status string as sent by a model.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" | "in-progress" | "active" => Some(Self::InProgress),
            "done" | "complete" | "completed" => Some(Self::Done),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    pub description: String,
    #[serde(default)]
    pub status: StepStatus,
}

/// A work plan the agent keeps for multi-step requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub steps: Vec<PlanStep>,
}

impl Plan {
    /// Number of steps marked done or skipped.
    pub fn finished_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Done | StepStatus::Skipped))
            .count()
    }
}

/// A named arrangement of components for preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub component_ids: Vec<String>,
}

/// The project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub plans: Vec<Plan>,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_scene: Option<String>,
}

impl Project {
    /// Create an empty project with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id("proj"),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub fn plan_mut(&mut self, id: &str) -> Option<&mut Plan> {
        self.plans.iter_mut().find(|p| p.id == id)
    }

    /// One-paragraph description used in provider system prompts.
    pub fn summary(&self) -> String {
        let name = if self.name.is_empty() {
            "Untitled project"
        } else {
            self.name.as_str()
        };

        let mut lines = vec![format!(
            "{}: {} component(s), {} asset(s), {} plan(s), {} scene(s).",
            name,
            self.components.len(),
            self.assets.len(),
            self.plans.len(),
            self.scenes.len()
        )];

        for component in &self.components {
            lines.push(format!("- component {} \"{}\"", component.id, component.name));
        }
        for plan in &self.plans {
            lines.push(format!(
                "- plan {} \"{}\" ({}/{} steps finished)",
                plan.id,
                plan.title,
                plan.finished_steps(),
                plan.steps.len()
            ));
        }
        if let Some(scene) = &self.active_scene {
            lines.push(format!("Active scene: {}", scene));
        }

        lines.join("\n")
    }
}

/// Generate a prefixed identifier such as `comp-1f0c...`.
pub fn new_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &id[..12])
}

/// A pure transformation of the project document.
pub type ProjectUpdater = Box<dyn FnOnce(Project) -> Project + Send>;

/// Mutation capability supplied by the caller.
///
/// Every project mutation the core performs goes through [`ProjectSink::apply`],
/// synchronously, before the tool that caused it returns.
pub trait ProjectSink: Send + Sync {
    /// Apply an updater to the caller's document.
    fn apply(&self, updater: ProjectUpdater);

    /// Current document, if the caller is willing to share it.
    ///
    /// Used to refresh the snapshot carried by continuation turns. Callers
    /// that do not override this keep the original snapshot for the whole
    /// request.
    fn snapshot(&self) -> Option<Project> {
        None
    }
}

/// Sink that discards every update.
pub struct NoopSink;

impl ProjectSink for NoopSink {
    fn apply(&self, _updater: ProjectUpdater) {}
}

/// Reference sink that keeps the document in memory.
///
/// Cloning shares the same document. Concurrent writers get
/// last-writer-wins semantics.
#[derive(Clone, Default)]
pub struct InMemoryProject {
    inner: Arc<RwLock<Project>>,
}

impl InMemoryProject {
    pub fn new(project: Project) -> Self {
        Self {
            inner: Arc::new(RwLock::new(project)),
        }
    }

    /// Read a copy of the current document.
    pub fn get(&self) -> Project {
        match self.inner.read() {
            Ok(project) => project.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProjectSink for InMemoryProject {
    fn apply(&self, updater: ProjectUpdater) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Hand the updater a copy so a panicking updater leaves the document intact.
        let updated = updater(guard.clone());
        *guard = updated;
    }

    fn snapshot(&self) -> Option<Project> {
        Some(self.get())
    }
}
