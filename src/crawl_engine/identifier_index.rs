//! Identifier extraction and cross-run deduplication
//!
//! A [`CrawlSession`] remembers what this run has already handed out; the
//! [`IdentifierIndex`] adds the store's view of what earlier runs persisted.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashSet;
use log::{debug, warn};
use url::Url;

use super::crawl_types::{HarvestResult, WorkItem};
use super::retry::RetryPolicy;
use crate::store::ExtensionStore;
use crate::utils::{DEFAULT_LISTING_URL, IDENTIFIER_PARAM};

/// Parse the identifying query parameter out of a detail URL.
///
/// Relative links are resolved against the marketplace origin. Returns `None`
/// when the parameter is missing or empty.
#[must_use]
pub fn extract_identifier(url: &str) -> Option<String> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => Url::parse(DEFAULT_LISTING_URL).ok()?.join(url).ok()?,
    };

    parsed
        .query_pairs()
        .find(|(key, _)| key == IDENTIFIER_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// State scoped to one discovery run across every sort mode.
///
/// Both sets only grow. Safe to share across detail tasks.
#[derive(Debug, Default)]
pub struct CrawlSession {
    processed_identifiers: DashSet<String>,
    processed_urls: DashSet<String>,
    total_processed: AtomicUsize,
}

impl CrawlSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_identifier_processed(&self, identifier: &str) -> bool {
        self.processed_identifiers.contains(identifier)
    }

    /// Returns `true` if `identifier` was not yet claimed by this session
    pub fn claim_identifier(&self, identifier: &str) -> bool {
        self.processed_identifiers.insert(identifier.to_string())
    }

    #[must_use]
    pub fn is_url_processed(&self, url: &str) -> bool {
        self.processed_urls.contains(url)
    }

    pub fn mark_url_processed(&self, url: &str) {
        self.processed_urls.insert(url.to_string());
    }

    /// URLs from `urls` this session has not seen yet, in order, without repeats
    #[must_use]
    pub fn unseen_urls(&self, urls: &[String]) -> Vec<String> {
        let mut batch = HashSet::new();
        urls.iter()
            .filter(|url| !self.is_url_processed(url) && batch.insert(url.as_str()))
            .cloned()
            .collect()
    }

    /// Count items whose dispatch settled, success or not
    pub fn record_processed(&self, count: usize) {
        self.total_processed.fetch_add(count, Ordering::Relaxed);
    }

    #[must_use]
    pub fn total_processed(&self) -> usize {
        self.total_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn identifier_count(&self) -> usize {
        self.processed_identifiers.len()
    }
}

/// Session-plus-store existence filter for discovered URLs
pub struct IdentifierIndex<'a, S: ExtensionStore + ?Sized> {
    store: &'a S,
    retry: RetryPolicy,
}

impl<'a, S: ExtensionStore + ?Sized> IdentifierIndex<'a, S> {
    pub fn new(store: &'a S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Reduce `urls` to work items whose identifier is new to both the session
    /// and the store.
    ///
    /// Existence is checked with one batched store query per call. Returned
    /// identifiers are claimed in `session`, so no identifier is returned
    /// twice within a session. URLs without an identifier are logged and
    /// dropped.
    pub async fn filter_new(
        &self,
        urls: &[String],
        session: &CrawlSession,
    ) -> HarvestResult<Vec<WorkItem>> {
        let mut candidates = Vec::with_capacity(urls.len());
        for url in urls {
            match extract_identifier(url) {
                Some(identifier) if !session.is_identifier_processed(&identifier) => {
                    candidates.push(WorkItem {
                        url: url.clone(),
                        identifier,
                    });
                }
                Some(_) => {}
                None => warn!("Skipping URL without identifier: {url}"),
            }
        }

        if candidates.is_empty() {
            return Ok(candidates);
        }

        let identifiers: Vec<String> = candidates
            .iter()
            .map(|item| item.identifier.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let identifiers = &identifiers;

        let existing = self
            .retry
            .run("Existence check", || self.store.existing_identifiers(identifiers))
            .await?;

        let fresh: Vec<WorkItem> = candidates
            .into_iter()
            .filter(|item| !existing.contains(&item.identifier))
            .filter(|item| session.claim_identifier(&item.identifier))
            .collect();

        debug!(
            "{} of {} URLs are new ({} already stored)",
            fresh.len(),
            urls.len(),
            existing.len()
        );
        Ok(fresh)
    }
}
