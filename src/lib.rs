pub mod browser_setup;
pub mod config;
pub mod content_saver;
pub mod crawl_engine;
pub mod page_extractor;
pub mod store;
pub mod utils;

pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::{HarvestConfig, HarvestConfigBuilder, PageTimeouts};
pub use content_saver::{sanitize_folder_name, save_snapshot};
pub use crawl_engine::{
    BatchExecutor, BatchOutcome, CrawlSession, DetailFetcher, ExplorationLoop,
    ExplorationSettings, HarvestError, HarvestReport, HarvestResult, IdentifierIndex,
    ListingSession, Materialized, Materializer, ModeReport, NoOpProgress, ProgressReporter,
    RescrapeReport, RetryPolicy, Retryable, ScrollBudget, ScrollTracker, SortMode, Termination,
    WorkItem, extract_identifier, harvest_listings, rescrape_incomplete, rescrape_with_browser,
};
pub use page_extractor::{CandidateExtractor, ChromiumDetailFetcher, ChromiumListing};
pub use store::{
    ExtensionFields, ExtensionRecord, ExtensionStore, Reconciler, SqliteExtensionStore,
    StoreError, StoreResult, StoreStats, UpsertOutcome,
};
