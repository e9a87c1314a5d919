//! Core types for listing exploration and detail harvesting.
//!
//! This module contains the error type shared by the crawl engine, the sort
//! modes a listing is explored under, and the per-mode and per-run reports.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Error type for crawl engine operations
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Invalid configuration or precondition violation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error surfaced by the extension store
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Page failed to load
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// Bounded wait exceeded
    #[error("{operation} timeout after {secs} seconds")]
    Timeout { operation: String, secs: u64 },

    /// Page evaluation or DOM query failed
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Filesystem error while writing a snapshot
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Browser process or CDP failure
    #[error("Browser error: {0}")]
    Browser(String),
}

impl HarvestError {
    /// Only store contention is worth retrying; everything else is fatal for the item.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Convenience alias for Result with `HarvestError`
pub type HarvestResult<T> = Result<T, HarvestError>;

/// One detail page to fetch, derived at discovery time
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub url: String,
    pub identifier: String,
}

/// Listing orderings explored in sequence to get past the per-ordering result cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortMode {
    Installs,
    Rating,
    PublisherCount,
    UpdatedDate,
    ReleaseDate,
    Name,
}

impl SortMode {
    /// Default exploration order
    pub const ALL: [SortMode; 6] = [
        SortMode::Installs,
        SortMode::Rating,
        SortMode::PublisherCount,
        SortMode::UpdatedDate,
        SortMode::ReleaseDate,
        SortMode::Name,
    ];

    /// Value of the listing's `sortBy` query parameter
    #[must_use]
    pub const fn as_query(&self) -> &'static str {
        match self {
            SortMode::Installs => "Installs",
            SortMode::Rating => "Rating",
            SortMode::PublisherCount => "PublisherCount",
            SortMode::UpdatedDate => "UpdatedDate",
            SortMode::ReleaseDate => "ReleaseDate",
            SortMode::Name => "Name",
        }
    }

    /// Listing URL for this mode on top of `base`, keeping the base's other parameters
    pub fn listing_url(&self, base: &str) -> HarvestResult<String> {
        let mut url = url::Url::parse(base)
            .map_err(|e| HarvestError::Config(format!("invalid listing URL '{base}': {e}")))?;

        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "sortBy")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in &retained {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("sortBy", self.as_query());
        }

        Ok(url.into())
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// Settled counts of one `BatchExecutor::run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchOutcome {
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn absorb(&mut self, other: BatchOutcome) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// Why a sort mode stopped exploring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// Too many consecutive scroll cycles revealed nothing new
    Exhausted,
    /// Scroll budget spent
    ScrollLimit,
    /// Listing never loaded; the mode was skipped
    NavigationFailed,
}

/// Per-mode exploration summary
#[derive(Debug, Clone, Serialize)]
pub struct ModeReport {
    pub mode: SortMode,
    pub scrolls: usize,
    pub discovered: usize,
    pub outcome: BatchOutcome,
    pub termination: Termination,
}

/// Summary of a whole discovery run across sort modes
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarvestReport {
    pub modes: Vec<ModeReport>,
    pub total_processed: usize,
    pub elapsed: Duration,
}

impl HarvestReport {
    #[must_use]
    pub fn outcome(&self) -> BatchOutcome {
        let mut total = BatchOutcome::default();
        for mode in &self.modes {
            total.absorb(mode.outcome);
        }
        total
    }
}

/// Summary of a materialization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RescrapeReport {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
}

impl RescrapeReport {
    /// Rounded percentage of processed records, 0 when nothing was pending
    #[must_use]
    pub fn success_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.processed as f64 / self.total as f64) * 100.0).round() as u32
    }
}
