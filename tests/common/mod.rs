//! Test doubles and helpers for the marketscrape test suite

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use marketscrape::crawl_engine::{
    BatchOutcome, DetailFetcher, ExplorationSettings, HarvestError, HarvestResult, ListingSession,
    Materialized, Materializer, ModeReport, ProgressReporter, RetryPolicy, ScrollBudget, SortMode,
    WorkItem,
};
use marketscrape::store::{
    ExtensionFields, ExtensionRecord, ExtensionStore, SqliteExtensionStore, StoreError,
    StoreResult, StoreStats, UpsertOutcome,
};
use marketscrape::utils::DEFAULT_LISTING_URL;

/// Detail URL for an identifier, as the listing renders it
#[allow(dead_code)]
pub fn detail_url(identifier: &str) -> String {
    format!("https://marketplace.visualstudio.com/items?itemName={identifier}")
}

#[allow(dead_code)]
pub async fn memory_store() -> SqliteExtensionStore {
    SqliteExtensionStore::open_in_memory()
        .await
        .expect("in-memory store should open")
}

/// Single-mode settings with no settle delay and a fast retry schedule
#[allow(dead_code)]
pub fn test_settings(modes: &[SortMode], concurrency: usize) -> ExplorationSettings {
    ExplorationSettings {
        listing_url: DEFAULT_LISTING_URL.to_string(),
        sort_modes: modes.to_vec(),
        budget: ScrollBudget {
            max_scrolls: 200,
            max_empty_scrolls: 8,
        },
        settle: Duration::ZERO,
        concurrency,
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
    }
}

/// Listing that replays a scripted candidate set per extraction.
///
/// Extraction `0` is the first render after navigation; extraction `n` follows
/// scroll `n`. Past the end of the script the DOM is unchanged (the last set
/// is returned again). The script restarts on every navigation.
#[allow(dead_code)]
pub struct FakeListing {
    script: Vec<Vec<String>>,
    cursor: usize,
    failing_modes: HashSet<String>,
    pub navigations: Vec<String>,
    pub scrolls: usize,
}

#[allow(dead_code)]
impl FakeListing {
    pub fn new(script: Vec<Vec<String>>) -> Self {
        Self {
            script,
            cursor: 0,
            failing_modes: HashSet::new(),
            navigations: Vec::new(),
            scrolls: 0,
        }
    }

    /// Navigation to this mode's listing fails
    pub fn fail_mode(mut self, mode: SortMode) -> Self {
        self.failing_modes.insert(mode.as_query().to_string());
        self
    }
}

#[async_trait]
impl ListingSession for FakeListing {
    async fn navigate(&mut self, url: &str) -> HarvestResult<()> {
        self.navigations.push(url.to_string());
        self.cursor = 0;
        let failing = self
            .failing_modes
            .iter()
            .any(|mode| url.ends_with(&format!("sortBy={mode}")));
        if failing {
            return Err(HarvestError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".into(),
            });
        }
        Ok(())
    }

    async fn extract_candidates(&mut self) -> HarvestResult<Vec<String>> {
        let index = self.cursor.min(self.script.len().saturating_sub(1));
        Ok(self.script.get(index).cloned().unwrap_or_default())
    }

    async fn scroll_forward(&mut self) -> HarvestResult<()> {
        self.cursor += 1;
        self.scrolls += 1;
        Ok(())
    }
}

/// Fetcher that records every call and fails for chosen identifiers
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeFetcher {
    calls: AtomicUsize,
    fetched: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

#[allow(dead_code)]
impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(identifiers: &[&str]) -> Self {
        Self {
            failing: identifiers.iter().map(|s| (*s).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl DetailFetcher for FakeFetcher {
    async fn fetch_details(&self, item: &WorkItem) -> HarvestResult<ExtensionFields> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(item.identifier.clone());

        if self.failing.contains(&item.identifier) {
            return Err(HarvestError::Extraction(format!(
                "detail page for {} did not render",
                item.identifier
            )));
        }

        Ok(ExtensionFields {
            name: Some(format!("Name of {}", item.identifier)),
            url: Some(item.url.clone()),
            downloads: Some(0),
            ..Default::default()
        })
    }
}

/// Materializer that writes a tiny page through the real snapshot writer.
///
/// Reports `refreshed[identifier]` as the freshly scraped fields, or the
/// stored fields when none are scripted.
#[allow(dead_code)]
#[derive(Default)]
pub struct FakeMaterializer {
    pub failing: HashSet<String>,
    pub refreshed: HashMap<String, ExtensionFields>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Materializer for FakeMaterializer {
    async fn materialize(
        &self,
        record: &ExtensionRecord,
        url: &str,
        save_dir: &Path,
    ) -> HarvestResult<Materialized> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&record.identifier) {
            return Err(HarvestError::Timeout {
                operation: "Navigation".into(),
                secs: 120,
            });
        }

        let fields = self
            .refreshed
            .get(&record.identifier)
            .cloned()
            .unwrap_or_else(|| record.fields.clone());
        let name = fields
            .name
            .clone()
            .unwrap_or_else(|| record.identifier.clone());
        let html = format!("<html><body><h1>{name}</h1></body></html>");
        let path =
            marketscrape::save_snapshot(save_dir, &name, &record.identifier, url, &html).await?;
        Ok(Materialized { fields, path })
    }
}

/// Store wrapper that injects failures and counts calls.
///
/// `busy_*` counters are the number of upcoming calls that fail with
/// `StoreError::Busy`; `fatal_existence` makes every existence check fail
/// with a constraint error.
#[allow(dead_code)]
pub struct FlakyStore {
    inner: SqliteExtensionStore,
    pub busy_existence: AtomicU32,
    pub busy_upserts: AtomicU32,
    pub busy_marks: AtomicU32,
    pub fatal_existence: bool,
    pub existence_calls: AtomicUsize,
    pub upsert_calls: AtomicUsize,
    pub mark_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            inner: memory_store().await,
            busy_existence: AtomicU32::new(0),
            busy_upserts: AtomicU32::new(0),
            busy_marks: AtomicU32::new(0),
            fatal_existence: false,
            existence_calls: AtomicUsize::new(0),
            upsert_calls: AtomicUsize::new(0),
            mark_calls: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &SqliteExtensionStore {
        &self.inner
    }

    pub fn existence_calls(&self) -> usize {
        self.existence_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn mark_calls(&self) -> usize {
        self.mark_calls.load(Ordering::SeqCst)
    }
}

/// Consume one scripted failure, if any are left
fn take_failure(remaining: &AtomicU32) -> bool {
    remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl ExtensionStore for FlakyStore {
    async fn find(&self, identifier: &str) -> StoreResult<Option<ExtensionRecord>> {
        self.inner.find(identifier).await
    }

    async fn existing_identifiers(&self, identifiers: &[String]) -> StoreResult<HashSet<String>> {
        self.existence_calls.fetch_add(1, Ordering::SeqCst);
        if self.fatal_existence {
            return Err(StoreError::Constraint("no such table: extensions".into()));
        }
        if take_failure(&self.busy_existence) {
            return Err(StoreError::Busy("database is locked".into()));
        }
        self.inner.existing_identifiers(identifiers).await
    }

    async fn upsert(
        &self,
        identifier: &str,
        fields: &ExtensionFields,
    ) -> StoreResult<UpsertOutcome> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.busy_upserts) {
            return Err(StoreError::Busy("database is locked".into()));
        }
        self.inner.upsert(identifier, fields).await
    }

    async fn mark_materialized(&self, identifier: &str, local_path: &str) -> StoreResult<bool> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.busy_marks) {
            return Err(StoreError::Busy("database is locked".into()));
        }
        self.inner.mark_materialized(identifier, local_path).await
    }

    async fn incomplete(&self) -> StoreResult<Vec<ExtensionRecord>> {
        self.inner.incomplete().await
    }

    async fn stats(&self) -> StoreResult<StoreStats> {
        self.inner.stats().await
    }
}

/// Progress reporter that keeps every event as a line of text
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingProgress {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| event.starts_with(prefix))
            .count()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressReporter for RecordingProgress {
    fn report_mode_started(&self, mode: SortMode, url: &str) {
        self.push(format!("mode_started {mode} {url}"));
    }

    fn report_scroll(&self, mode: SortMode, scroll: u32, empty_streak: u32, new_urls: usize) {
        self.push(format!("scroll {mode} {scroll} {empty_streak} {new_urls}"));
    }

    fn report_batch_completed(&self, mode: SortMode, outcome: BatchOutcome) {
        self.push(format!(
            "batch {mode} {} {}",
            outcome.succeeded, outcome.failed
        ));
    }

    fn report_mode_finished(&self, report: &ModeReport) {
        self.push(format!("mode_finished {} {:?}", report.mode, report.termination));
    }

    fn report_materialized(&self, identifier: &str, path: &Path) {
        self.push(format!("materialized {identifier} {}", path.display()));
    }

    fn report_completed(&self, total_processed: usize) {
        self.push(format!("completed {total_processed}"));
    }

    fn report_error(&self, error: &str) {
        self.push(format!("error {error}"));
    }
}
