//! Browser-backed run orchestration
//!
//! Coordinates:
//! - Browser lifecycle management
//! - Discovery across sort modes through one listing tab
//! - The rescrape / materialization pass
//! - Cleanup on success and on failure

use std::path::PathBuf;

use anyhow::{Context, Result};
use chromiumoxide::Browser;
use log::{debug, info, warn};

use super::cleanup::{CleanupResult, cleanup_browser_and_data};
use super::crawl_types::{HarvestError, HarvestReport, RescrapeReport};
use super::exploration::ExplorationLoop;
use super::identifier_index::CrawlSession;
use super::progress::ProgressReporter;
use super::rescrape::rescrape_incomplete;
use crate::browser_setup::launch_browser;
use crate::config::HarvestConfig;
use crate::page_extractor::{CandidateExtractor, ChromiumDetailFetcher, ChromiumListing};
use crate::store::ExtensionStore;

/// Launch a browser, explore every sort mode and persist newly found extensions.
///
/// The browser is closed and its profile directory removed whether or not
/// the run succeeds.
pub async fn harvest_listings<S, P>(
    config: &HarvestConfig,
    store: &S,
    progress: &P,
) -> Result<HarvestReport>
where
    S: ExtensionStore + ?Sized,
    P: ProgressReporter,
{
    let (browser, handler, chrome_data_dir) = start_browser(config).await?;

    let result = discover(&browser, config, store, progress).await;

    release_browser(browser, handler, chrome_data_dir, progress).await;
    result
}

/// Launch a browser and snapshot every record not yet saved locally under
/// the configured save directory.
///
/// Fails before launching anything when the config has no save directory.
pub async fn rescrape_with_browser<S, P>(
    config: &HarvestConfig,
    store: &S,
    progress: &P,
) -> Result<RescrapeReport>
where
    S: ExtensionStore + ?Sized,
    P: ProgressReporter,
{
    let save_dir = config.save_dir().ok_or_else(|| {
        HarvestError::Config("a save directory is required for a rescrape pass".into())
    })?;

    let (browser, handler, chrome_data_dir) = start_browser(config).await?;

    let fetcher = ChromiumDetailFetcher::new(&browser, config.page_timeouts());
    let result = rescrape_incomplete(
        store,
        &fetcher,
        save_dir,
        config.materialize_concurrency(),
        config.retry_policy(),
        progress,
    )
    .await
    .context("Rescrape pass failed");
    drop(fetcher);

    release_browser(browser, handler, chrome_data_dir, progress).await;
    result
}

async fn start_browser(
    config: &HarvestConfig,
) -> Result<(Browser, tokio::task::JoinHandle<()>, PathBuf)> {
    launch_browser(
        config.headless(),
        config.chrome_data_dir().cloned(),
        std::time::Duration::from_secs(config.page_timeouts().navigation_secs),
    )
    .await
    .context("Failed to launch browser")
}

async fn discover<S, P>(
    browser: &Browser,
    config: &HarvestConfig,
    store: &S,
    progress: &P,
) -> Result<HarvestReport>
where
    S: ExtensionStore + ?Sized,
    P: ProgressReporter,
{
    let page = browser
        .new_page("about:blank")
        .await
        .context("Failed to open listing tab")?;

    let mut listing = ChromiumListing::new(
        page,
        CandidateExtractor::new(config.candidate_selectors().to_vec()),
        config.listing_ready_selector().to_string(),
        config.scroll_viewports(),
        config.page_timeouts(),
    );
    let fetcher = ChromiumDetailFetcher::new(browser, config.page_timeouts());
    let session = CrawlSession::new();

    let result = match ExplorationLoop::new(store, &fetcher, progress, config.exploration_settings())
    {
        Ok(exploration) => exploration
            .run(&mut listing, &session)
            .await
            .context("Discovery run failed"),
        Err(e) => Err(e).context("Invalid exploration settings"),
    };

    listing.close().await;
    result
}

async fn release_browser<P: ProgressReporter>(
    browser: Browser,
    handler: tokio::task::JoinHandle<()>,
    chrome_data_dir: PathBuf,
    progress: &P,
) {
    info!("Releasing browser");
    match cleanup_browser_and_data(browser, handler, chrome_data_dir).await {
        CleanupResult::Success => debug!("Browser and data cleanup completed successfully"),
        CleanupResult::PartialFailure(errors) => {
            warn!("Cleanup completed with failures: {errors:?}");
            for error in &errors {
                progress.report_error(&format!("Cleanup error: {error}"));
            }
        }
    }
}
