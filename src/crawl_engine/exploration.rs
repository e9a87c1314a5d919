//! Listing exploration across sort modes
//!
//! One [`ListingSession`] is driven strictly sequentially through
//! navigate → extract → dispatch → (scroll → settle → extract → dispatch)*
//! until the [`ScrollTracker`] says stop. The only concurrency is inside
//! dispatch, where the [`BatchExecutor`] runs detail tasks in waves.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, info, warn};

use super::batch_executor::BatchExecutor;
use super::crawl_types::{
    BatchOutcome, HarvestReport, HarvestResult, ModeReport, SortMode, Termination, WorkItem,
};
use super::identifier_index::{CrawlSession, IdentifierIndex};
use super::progress::ProgressReporter;
use super::retry::RetryPolicy;
use super::scroll_tracker::{ScrollBudget, ScrollTracker};
use crate::store::{ExtensionFields, ExtensionStore, Reconciler};

/// The single page context a mode is explored through
#[async_trait]
pub trait ListingSession: Send {
    /// Load `url` and wait until the listing has rendered
    async fn navigate(&mut self, url: &str) -> HarvestResult<()>;

    /// Full set of candidate detail URLs currently in the DOM
    async fn extract_candidates(&mut self) -> HarvestResult<Vec<String>>;

    /// Scroll far enough to trigger the next lazy-load
    async fn scroll_forward(&mut self) -> HarvestResult<()>;
}

/// Fetches and parses one item's detail page
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_details(&self, item: &WorkItem) -> HarvestResult<ExtensionFields>;
}

/// Knobs of one discovery run
#[derive(Debug, Clone)]
pub struct ExplorationSettings {
    pub listing_url: String,
    pub sort_modes: Vec<SortMode>,
    pub budget: ScrollBudget,
    pub settle: Duration,
    pub concurrency: usize,
    pub retry: RetryPolicy,
}

pub struct ExplorationLoop<'a, S: ExtensionStore + ?Sized, D: DetailFetcher, P: ProgressReporter> {
    store: &'a S,
    fetcher: &'a D,
    progress: &'a P,
    settings: ExplorationSettings,
    executor: BatchExecutor,
}

impl<'a, S, D, P> ExplorationLoop<'a, S, D, P>
where
    S: ExtensionStore + ?Sized,
    D: DetailFetcher,
    P: ProgressReporter,
{
    /// Fails when `settings.concurrency` is zero.
    pub fn new(
        store: &'a S,
        fetcher: &'a D,
        progress: &'a P,
        settings: ExplorationSettings,
    ) -> HarvestResult<Self> {
        let executor = BatchExecutor::new(settings.concurrency)?;
        Ok(Self {
            store,
            fetcher,
            progress,
            settings,
            executor,
        })
    }

    /// Explore every configured sort mode in order, sharing `session`.
    ///
    /// Only store failures that outlast the retry policy end the run early.
    pub async fn run<L: ListingSession>(
        &self,
        listing: &mut L,
        session: &CrawlSession,
    ) -> HarvestResult<HarvestReport> {
        let start = Instant::now();
        let mut report = HarvestReport::default();

        for &mode in &self.settings.sort_modes {
            let mode_report = self.run_mode(listing, mode, session).await?;
            report.modes.push(mode_report);
        }

        report.total_processed = session.total_processed();
        report.elapsed = start.elapsed();

        info!(
            "Discovery finished: {} items processed across {} sort modes in {:.1}s",
            report.total_processed,
            report.modes.len(),
            report.elapsed.as_secs_f64()
        );
        self.progress.report_completed(report.total_processed);
        Ok(report)
    }

    /// Explore one sort mode until the listing is exhausted or the scroll
    /// budget is spent. A listing that fails to load skips the mode.
    pub async fn run_mode<L: ListingSession>(
        &self,
        listing: &mut L,
        mode: SortMode,
        session: &CrawlSession,
    ) -> HarvestResult<ModeReport> {
        let url = mode.listing_url(&self.settings.listing_url)?;
        info!("=== Exploring listing sorted by {mode} ===");
        self.progress.report_mode_started(mode, &url);

        let mut report = ModeReport {
            mode,
            scrolls: 0,
            discovered: 0,
            outcome: BatchOutcome::default(),
            termination: Termination::NavigationFailed,
        };

        if let Err(e) = listing.navigate(&url).await {
            warn!("Skipping sort mode {mode}: {e}");
            self.progress.report_error(&format!("{mode}: {e}"));
            self.progress.report_mode_finished(&report);
            return Ok(report);
        }

        let initial = self.extract(listing, mode).await;
        let delta = session.unseen_urls(&initial);
        info!("{mode}: {} candidate URLs on first render", delta.len());
        report.discovered += delta.len();
        report.outcome.absorb(self.dispatch(mode, &delta, session).await?);

        let mut tracker = ScrollTracker::new(self.settings.budget);
        while tracker.should_continue() {
            tracker.begin_scroll();

            if let Err(e) = listing.scroll_forward().await {
                warn!("{mode}: scroll {} failed: {e}", tracker.scroll_count());
            }
            if !self.settings.settle.is_zero() {
                tokio::time::sleep(self.settings.settle).await;
            }

            let candidates = self.extract(listing, mode).await;
            let delta = session.unseen_urls(&candidates);
            tracker.record_cycle(delta.len());

            debug!(
                "{mode}: scroll {}/{} found {} new URLs (empty streak {}/{})",
                tracker.scroll_count(),
                self.settings.budget.max_scrolls,
                delta.len(),
                tracker.consecutive_empty(),
                self.settings.budget.max_empty_scrolls
            );
            self.progress.report_scroll(
                mode,
                tracker.scroll_count(),
                tracker.consecutive_empty(),
                delta.len(),
            );

            if !delta.is_empty() {
                report.discovered += delta.len();
                report.outcome.absorb(self.dispatch(mode, &delta, session).await?);
                info!("{mode}: {} items processed so far", session.total_processed());
            }
        }

        report.scrolls = tracker.scroll_count() as usize;
        report.termination = tracker.termination().unwrap_or(Termination::ScrollLimit);
        match report.termination {
            Termination::Exhausted => info!(
                "{mode}: {} scrolls in a row found nothing new, moving on",
                tracker.consecutive_empty()
            ),
            _ => info!("{mode}: scroll limit reached, moving on"),
        }

        self.progress.report_mode_finished(&report);
        Ok(report)
    }

    /// Extraction failures count as an empty cycle
    async fn extract<L: ListingSession>(&self, listing: &mut L, mode: SortMode) -> Vec<String> {
        match listing.extract_candidates().await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("{mode}: candidate extraction failed: {e}");
                Vec::new()
            }
        }
    }

    /// Filter a URL delta down to new identifiers and run their detail tasks.
    ///
    /// Delta URLs are marked processed once the store check has succeeded.
    async fn dispatch(
        &self,
        mode: SortMode,
        delta: &[String],
        session: &CrawlSession,
    ) -> HarvestResult<BatchOutcome> {
        if delta.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let index = IdentifierIndex::new(self.store, self.settings.retry);
        let items = index.filter_new(delta, session).await?;
        for url in delta {
            session.mark_url_processed(url);
        }

        if items.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let outcome = self
            .executor
            .run(items, |item| self.harvest_item(item, session))
            .await;
        self.progress.report_batch_completed(mode, outcome);
        Ok(outcome)
    }

    /// Detail fetch then upsert for one item. Settles exactly once.
    async fn harvest_item(&self, item: WorkItem, session: &CrawlSession) -> HarvestResult<bool> {
        let result = self.fetch_and_store(&item).await;
        session.record_processed(1);

        if let Err(e) = &result {
            warn!("Failed to harvest {} ({}): {e}", item.identifier, item.url);
        }
        result
    }

    async fn fetch_and_store(&self, item: &WorkItem) -> HarvestResult<bool> {
        let retry = self.settings.retry;
        let identifier = item.identifier.as_str();

        // A concurrent task or another process may have stored it since filtering
        let stored = retry
            .run("Lookup", || self.store.find(identifier))
            .await?;
        if let Some(record) = stored {
            debug!(
                "{identifier} already stored as {:?}, skipping",
                record.fields.name.as_deref().unwrap_or("<unnamed>")
            );
            return Ok(false);
        }

        debug!("Fetching {}", item.url);
        let fields = self.fetcher.fetch_details(item).await?;

        let reconciler = Reconciler::new(self.store);
        let fields = &fields;
        retry
            .run("Upsert", || reconciler.upsert(identifier, fields))
            .await?;
        Ok(true)
    }
}
