//! Type-safe builder for `HarvestConfig` using the typestate pattern
//!
//! The database path and the listing URL must be set, in that order, before
//! `build()` becomes available. Everything else has a default.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::HarvestConfig;
use crate::crawl_engine::crawl_types::{HarvestError, HarvestResult, SortMode};
use crate::utils::{
    DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_CANDIDATE_SELECTORS, DEFAULT_DETAIL_CONCURRENCY,
    DEFAULT_MATERIALIZE_CONCURRENCY, DEFAULT_MAX_EMPTY_SCROLLS, DEFAULT_MAX_SCROLLS,
    DEFAULT_MAX_STORE_CONNECTIONS, DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_BASE_DELAY_MILLIS, DEFAULT_SCROLL_VIEWPORTS, DEFAULT_SELECTOR_TIMEOUT_SECS,
    DEFAULT_SETTLE_MILLIS, LISTING_READY_SELECTOR,
};

// Type states for the builder
pub struct WithDatabasePath;
pub struct WithListingUrl;

pub struct HarvestConfigBuilder<State = ()> {
    pub(crate) config: HarvestConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for HarvestConfigBuilder<()> {
    fn default() -> Self {
        Self {
            config: HarvestConfig {
                database_path: PathBuf::new(),
                listing_url: String::new(),
                save_dir: None,
                headless: true,
                chrome_data_dir: None,
                detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
                materialize_concurrency: DEFAULT_MATERIALIZE_CONCURRENCY,
                max_scrolls: DEFAULT_MAX_SCROLLS,
                max_empty_scrolls: DEFAULT_MAX_EMPTY_SCROLLS,
                scroll_viewports: DEFAULT_SCROLL_VIEWPORTS,
                settle_millis: DEFAULT_SETTLE_MILLIS,
                retry_attempts: DEFAULT_RETRY_ATTEMPTS,
                retry_base_delay_millis: DEFAULT_RETRY_BASE_DELAY_MILLIS,
                navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
                action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
                selector_timeout_secs: DEFAULT_SELECTOR_TIMEOUT_SECS,
                listing_ready_selector: LISTING_READY_SELECTOR.to_string(),
                candidate_selectors: DEFAULT_CANDIDATE_SELECTORS
                    .iter()
                    .map(|s| (*s).to_string())
                    .collect(),
                sort_modes: SortMode::ALL.to_vec(),
                max_store_connections: DEFAULT_MAX_STORE_CONNECTIONS,
            },
            _phantom: PhantomData,
        }
    }
}

impl HarvestConfig {
    /// Create a builder for configuring a `HarvestConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> HarvestConfigBuilder<()> {
        HarvestConfigBuilder::default()
    }
}

impl HarvestConfigBuilder<()> {
    pub fn database_path(self, path: impl Into<PathBuf>) -> HarvestConfigBuilder<WithDatabasePath> {
        let mut config = self.config;
        config.database_path = path.into();
        HarvestConfigBuilder {
            config,
            _phantom: PhantomData,
        }
    }
}

impl HarvestConfigBuilder<WithDatabasePath> {
    pub fn listing_url(self, url: impl Into<String>) -> HarvestConfigBuilder<WithListingUrl> {
        let url_string = url.into();

        // Normalize URL: add https:// if no scheme is present
        let normalized_url =
            if url_string.starts_with("http://") || url_string.starts_with("https://") {
                url_string
            } else {
                format!("https://{url_string}")
            };

        let mut config = self.config;
        config.listing_url = normalized_url;
        HarvestConfigBuilder {
            config,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when all required fields are set
impl HarvestConfigBuilder<WithListingUrl> {
    pub fn build(self) -> HarvestResult<HarvestConfig> {
        let mut config = self.config;

        if config.database_path.as_os_str().is_empty() {
            return Err(invalid("database_path must not be empty"));
        }
        config.database_path = std::path::absolute(&config.database_path)?;

        url::Url::parse(&config.listing_url)
            .map_err(|e| invalid(&format!("listing_url '{}': {e}", config.listing_url)))?;

        if config.detail_concurrency == 0 || config.materialize_concurrency == 0 {
            return Err(invalid("concurrency limits must be at least 1"));
        }
        if config.retry_attempts == 0 {
            return Err(invalid("retry_attempts must be at least 1"));
        }
        if config.max_scrolls == 0 || config.max_empty_scrolls == 0 {
            return Err(invalid("scroll limits must be at least 1"));
        }
        if config.candidate_selectors.iter().all(|s| s.trim().is_empty()) {
            return Err(invalid("at least one candidate selector is required"));
        }
        config.candidate_selectors.retain(|s| !s.trim().is_empty());
        if config.sort_modes.is_empty() {
            return Err(invalid("at least one sort mode is required"));
        }
        if config.max_store_connections == 0 {
            return Err(invalid("max_store_connections must be at least 1"));
        }

        Ok(config)
    }
}

fn invalid(message: &str) -> HarvestError {
    HarvestError::Config(message.to_string())
}
