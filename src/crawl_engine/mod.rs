//! Crawl Engine Module
//!
//! This module contains the listing exploration loop, the wave executor and
//! retry policy it dispatches through, and the browser-backed orchestration
//! that wires them to the store.

// Sub-modules
pub mod batch_executor;
pub mod cleanup;
pub mod crawl_types;
pub mod exploration;
pub mod identifier_index;
pub mod orchestrator;
pub mod page_timeout;
pub mod progress;
pub mod rescrape;
pub mod retry;
pub mod scroll_tracker;

// Re-exports for public API
pub use batch_executor::BatchExecutor;
pub use crawl_types::{
    BatchOutcome, HarvestError, HarvestReport, HarvestResult, ModeReport, RescrapeReport,
    SortMode, Termination, WorkItem,
};
pub use exploration::{DetailFetcher, ExplorationLoop, ExplorationSettings, ListingSession};
pub use identifier_index::{CrawlSession, IdentifierIndex, extract_identifier};
pub use orchestrator::{harvest_listings, rescrape_with_browser};
pub use progress::{NoOpProgress, ProgressReporter};
pub use rescrape::{Materialized, Materializer, rescrape_incomplete};
pub use retry::{RetryPolicy, Retryable};
pub use scroll_tracker::{ScrollBudget, ScrollTracker};
