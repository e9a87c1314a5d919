//! Shared configuration constants for marketscrape
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Marketplace search listing; each sort mode appends its own `sortBy`
pub const DEFAULT_LISTING_URL: &str =
    "https://marketplace.visualstudio.com/search?target=VSCode&category=All%20categories";

/// Query marker every detail link carries
pub const ITEM_LINK_MARKER: &str = "/items?itemName=";

/// Query parameter holding the extension identifier
pub const IDENTIFIER_PARAM: &str = "itemName";

/// Selector the listing page must render before extraction starts
pub const LISTING_READY_SELECTOR: &str = ".item-list-container";

/// Candidate link selectors, tried in order and unioned.
///
/// The marketplace has shipped grid, list and card variants of the same
/// listing; each strategy covers one of them.
pub const DEFAULT_CANDIDATE_SELECTORS: &[&str] = &[
    ".item-grid-container .row-item a",
    ".item-list-container .row-item a",
    ".gallery-item-card-container a",
    ".ux-item-card a",
    ".item-grid-container a[href*=\"/items\"]",
    ".item-list-container a[href*=\"/items\"]",
];

/// A listing mode ends after this many scrolls regardless of discoveries
pub const DEFAULT_MAX_SCROLLS: u32 = 200;

/// A listing mode ends after this many scrolls in a row found nothing new
pub const DEFAULT_MAX_EMPTY_SCROLLS: u32 = 8;

/// Scroll distance in viewport heights
pub const DEFAULT_SCROLL_VIEWPORTS: u32 = 5;

/// Wait after each scroll for lazy-loaded rows to render
pub const DEFAULT_SETTLE_MILLIS: u64 = 3_000;

/// Detail pages fetched concurrently per wave during discovery
pub const DEFAULT_DETAIL_CONCURRENCY: usize = 20;

/// Detail pages materialized concurrently per wave during rescrape
pub const DEFAULT_MATERIALIZE_CONCURRENCY: usize = 5;

/// Total attempts for a store operation that keeps failing transiently
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 5;

/// Backoff before the second attempt; doubles after every further failure
pub const DEFAULT_RETRY_BASE_DELAY_MILLIS: u64 = 500;

/// Bound on a full page navigation
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 120;

/// Bound on a single in-page action (evaluate, scroll)
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 60;

/// Bound on waiting for the listing container to appear
pub const DEFAULT_SELECTOR_TIMEOUT_SECS: u64 = 80;

/// SQLite is single-writer; one pooled connection avoids self-inflicted locks
pub const DEFAULT_MAX_STORE_CONNECTIONS: u32 = 1;

/// Default database location relative to the working directory
pub const DEFAULT_DATABASE_PATH: &str = "data/vscode_extensions.sqlite";

/// Snapshot file written inside each materialized folder
pub const SNAPSHOT_FILE_NAME: &str = "content.html";

/// Chrome user agent string presented to the marketplace
///
/// Desktop Chrome on Windows; the marketplace serves its full listing markup
/// to this agent.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
