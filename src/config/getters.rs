//! Getter methods for `HarvestConfig`
//!
//! Plain accessors plus the engine-facing values derived from them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{HarvestConfig, PageTimeouts};
use crate::crawl_engine::crawl_types::SortMode;
use crate::crawl_engine::exploration::ExplorationSettings;
use crate::crawl_engine::retry::RetryPolicy;
use crate::crawl_engine::scroll_tracker::ScrollBudget;

impl HarvestConfig {
    #[must_use]
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    #[must_use]
    pub fn listing_url(&self) -> &str {
        &self.listing_url
    }

    #[must_use]
    pub fn save_dir(&self) -> Option<&PathBuf> {
        self.save_dir.as_ref()
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }

    #[must_use]
    pub fn detail_concurrency(&self) -> usize {
        self.detail_concurrency
    }

    #[must_use]
    pub fn materialize_concurrency(&self) -> usize {
        self.materialize_concurrency
    }

    #[must_use]
    pub fn scroll_viewports(&self) -> u32 {
        self.scroll_viewports
    }

    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }

    #[must_use]
    pub fn listing_ready_selector(&self) -> &str {
        &self.listing_ready_selector
    }

    #[must_use]
    pub fn candidate_selectors(&self) -> &[String] {
        &self.candidate_selectors
    }

    #[must_use]
    pub fn sort_modes(&self) -> &[SortMode] {
        &self.sort_modes
    }

    #[must_use]
    pub fn max_store_connections(&self) -> u32 {
        self.max_store_connections
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_millis),
        )
    }

    #[must_use]
    pub fn scroll_budget(&self) -> ScrollBudget {
        ScrollBudget {
            max_scrolls: self.max_scrolls,
            max_empty_scrolls: self.max_empty_scrolls,
        }
    }

    #[must_use]
    pub fn page_timeouts(&self) -> PageTimeouts {
        PageTimeouts {
            navigation_secs: self.navigation_timeout_secs,
            action_secs: self.action_timeout_secs,
            selector_secs: self.selector_timeout_secs,
        }
    }

    /// Everything the exploration loop needs from this config
    #[must_use]
    pub fn exploration_settings(&self) -> ExplorationSettings {
        ExplorationSettings {
            listing_url: self.listing_url.clone(),
            sort_modes: self.sort_modes.clone(),
            budget: self.scroll_budget(),
            settle: self.settle(),
            concurrency: self.detail_concurrency,
            retry: self.retry_policy(),
        }
    }
}
