//! Termination heuristic for one sort mode's scroll cycles

use serde::{Deserialize, Serialize};

use super::crawl_types::Termination;
use crate::utils::{DEFAULT_MAX_EMPTY_SCROLLS, DEFAULT_MAX_SCROLLS};

/// Liveness bound on exploring one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollBudget {
    pub max_scrolls: u32,
    pub max_empty_scrolls: u32,
}

impl Default for ScrollBudget {
    fn default() -> Self {
        Self {
            max_scrolls: DEFAULT_MAX_SCROLLS,
            max_empty_scrolls: DEFAULT_MAX_EMPTY_SCROLLS,
        }
    }
}

/// Per-mode counters. A fresh tracker is created on every mode entry.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    budget: ScrollBudget,
    scroll_count: u32,
    consecutive_empty: u32,
}

impl ScrollTracker {
    #[must_use]
    pub fn new(budget: ScrollBudget) -> Self {
        Self {
            budget,
            scroll_count: 0,
            consecutive_empty: 0,
        }
    }

    #[must_use]
    pub fn should_continue(&self) -> bool {
        self.termination().is_none()
    }

    pub fn begin_scroll(&mut self) {
        self.scroll_count += 1;
    }

    /// Feed the size of a cycle's delta (after URL-level dedup).
    pub fn record_cycle(&mut self, new_urls: usize) {
        if new_urls == 0 {
            self.consecutive_empty += 1;
        } else {
            self.consecutive_empty = 0;
        }
    }

    /// Reason to stop, if any. Exhaustion wins when both bounds are hit.
    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        if self.consecutive_empty >= self.budget.max_empty_scrolls {
            Some(Termination::Exhausted)
        } else if self.scroll_count >= self.budget.max_scrolls {
            Some(Termination::ScrollLimit)
        } else {
            None
        }
    }

    #[must_use]
    pub fn scroll_count(&self) -> u32 {
        self.scroll_count
    }

    #[must_use]
    pub fn consecutive_empty(&self) -> u32 {
        self.consecutive_empty
    }
}
