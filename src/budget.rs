//! Action Budget
//!
//! Caps how many tool calls one orchestrator may execute. The count only
//! resets when the caller asks.

use serde::{Deserialize, Serialize};

/// Budget used when configuration does not set one.
pub const DEFAULT_ACTION_BUDGET: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionBudget {
    limit: u32,
    used: u32,
}

/// Snapshot reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub total: u32,
    pub used: u32,
    pub remaining: u32,
}

impl ActionBudget {
    pub fn new(limit: u32) -> Self {
        Self { limit, used: 0 }
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }

    /// Record executed tool calls.
    pub fn consume(&mut self, calls: u32) {
        self.used = self.used.saturating_add(calls);
    }

    /// Change the limit without touching the used count.
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    pub fn status(&self) -> BudgetStatus {
        BudgetStatus {
            total: self.limit,
            used: self.used,
            remaining: self.remaining(),
        }
    }
}

impl Default for ActionBudget {
    fn default() -> Self {
        Self::new(DEFAULT_ACTION_BUDGET)
    }
}
