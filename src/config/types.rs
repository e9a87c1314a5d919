//! Core configuration types for a harvest run
//!
//! This module contains the main `HarvestConfig` struct and the small
//! value types derived from it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::crawl_engine::crawl_types::SortMode;

/// Main configuration struct for discovery and rescrape runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// SQLite database file.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) database_path: PathBuf,
    pub(crate) listing_url: String,
    pub(crate) save_dir: Option<PathBuf>,
    pub(crate) headless: bool,
    pub(crate) chrome_data_dir: Option<PathBuf>,

    /// Detail tasks per wave during discovery
    pub(crate) detail_concurrency: usize,
    /// Snapshot tasks per wave during rescrape
    pub(crate) materialize_concurrency: usize,

    pub(crate) max_scrolls: u32,
    pub(crate) max_empty_scrolls: u32,
    pub(crate) scroll_viewports: u32,
    pub(crate) settle_millis: u64,

    pub(crate) retry_attempts: u32,
    pub(crate) retry_base_delay_millis: u64,

    pub(crate) navigation_timeout_secs: u64,
    pub(crate) action_timeout_secs: u64,
    pub(crate) selector_timeout_secs: u64,

    pub(crate) listing_ready_selector: String,
    /// Candidate link strategies, tried in order and unioned
    pub(crate) candidate_selectors: Vec<String>,
    pub(crate) sort_modes: Vec<SortMode>,

    pub(crate) max_store_connections: u32,
}

/// Bounds on browser waits, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTimeouts {
    /// Full page load
    pub navigation_secs: u64,
    /// Single in-page action (evaluate, scroll, open tab)
    pub action_secs: u64,
    /// Listing readiness selector
    pub selector_secs: u64,
}
