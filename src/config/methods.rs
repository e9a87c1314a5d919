//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;

use super::builder::HarvestConfigBuilder;
use crate::crawl_engine::crawl_types::SortMode;

impl<State> HarvestConfigBuilder<State> {
    /// Root folder for rescrape snapshots
    #[must_use]
    pub fn save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.save_dir = Some(dir.into());
        self
    }

    /// Set browser headless mode. Headed mode is for watching a run locally.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Profile directory for the browser; a per-process temp dir otherwise
    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.chrome_data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn detail_concurrency(mut self, limit: usize) -> Self {
        self.config.detail_concurrency = limit;
        self
    }

    #[must_use]
    pub fn materialize_concurrency(mut self, limit: usize) -> Self {
        self.config.materialize_concurrency = limit;
        self
    }

    #[must_use]
    pub fn max_scrolls(mut self, scrolls: u32) -> Self {
        self.config.max_scrolls = scrolls;
        self
    }

    #[must_use]
    pub fn max_empty_scrolls(mut self, scrolls: u32) -> Self {
        self.config.max_empty_scrolls = scrolls;
        self
    }

    /// Scroll distance per cycle, in viewport heights
    #[must_use]
    pub fn scroll_viewports(mut self, viewports: u32) -> Self {
        self.config.scroll_viewports = viewports;
        self
    }

    #[must_use]
    pub fn settle_millis(mut self, millis: u64) -> Self {
        self.config.settle_millis = millis;
        self
    }

    /// Retry schedule for store operations: `attempts` total calls,
    /// `base_delay_millis * 2^i` after the i-th failure
    #[must_use]
    pub fn retry(mut self, attempts: u32, base_delay_millis: u64) -> Self {
        self.config.retry_attempts = attempts;
        self.config.retry_base_delay_millis = base_delay_millis;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.config.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn action_timeout_secs(mut self, secs: u64) -> Self {
        self.config.action_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn selector_timeout_secs(mut self, secs: u64) -> Self {
        self.config.selector_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn listing_ready_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.listing_ready_selector = selector.into();
        self
    }

    /// Replace the candidate link strategies
    #[must_use]
    pub fn candidate_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.candidate_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn sort_modes(mut self, modes: impl Into<Vec<SortMode>>) -> Self {
        self.config.sort_modes = modes.into();
        self
    }

    #[must_use]
    pub fn max_store_connections(mut self, connections: u32) -> Self {
        self.config.max_store_connections = connections;
        self
    }
}
