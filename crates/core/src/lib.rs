//! Builder Agent Core
//!
//! Foundational types for the Builder Agent workspace. This crate has zero
//! dependencies on provider or tool code.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `project` - Project document model and the `ProjectSink` mutation capability
//! - `ui` - Optional presentation-layer hooks (`UiActions`)
//! - `context` - Per-call `ToolContext` handed to tool implementations

pub mod context;
pub mod error;
pub mod project;
pub mod ui;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Project Document ───────────────────────────────────────────────────
pub use project::{
    new_id, Asset, AssetKind, Component, InMemoryProject, NoopSink, Plan, PlanStep, Project,
    ProjectSink, ProjectUpdater, Scene, StepStatus,
};

// ── UI Hooks ───────────────────────────────────────────────────────────
pub use ui::{NoUi, UiActions, UiHookOutcome};

// ── Tool Context ───────────────────────────────────────────────────────
pub use context::ToolContext;
