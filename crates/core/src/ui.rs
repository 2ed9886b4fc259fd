//! UI Action Hooks
//!
//! Optional notifications the core sends to the presentation layer as a side
//! effect of certain tools. Every method has a default that reports
//! [`UiHookOutcome::Unsupported`], so an application implements only the hooks
//! it has. Hooks are notifications: they must return promptly and are never
//! awaited.

use serde::{Deserialize, Serialize};

/// Result of delivering a UI notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UiHookOutcome {
    Delivered,
    /// The application did not provide this hook
    Unsupported,
    Failed { message: String },
}

impl UiHookOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, UiHookOutcome::Delivered)
    }
}

/// Presentation-layer hooks.
pub trait UiActions: Send + Sync {
    /// Switch the active editor tab (e.g. "preview", "code", "assets").
    fn switch_tab(&self, _tab: &str) -> UiHookOutcome {
        UiHookOutcome::Unsupported
    }

    /// Show the generated code for a component.
    fn show_code(&self, _component_id: &str) -> UiHookOutcome {
        UiHookOutcome::Unsupported
    }

    /// Scroll to and highlight a component in the preview.
    fn focus_component(&self, _component_id: &str) -> UiHookOutcome {
        UiHookOutcome::Unsupported
    }
}

/// Hooks for headless callers: every notification is unsupported.
pub struct NoUi;

impl UiActions for NoUi {}
