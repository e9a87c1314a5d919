//! Persisted extension records and the scraped attribute set

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scraped attributes of one extension.
///
/// Every field is replaced as a whole on upsert. Empty sequences are never
/// stored; use [`ExtensionFields::normalized`] before persisting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub repository: Option<String>,
    pub downloads: Option<u64>,
    pub installs: Option<u64>,
    pub review_count: Option<u64>,
    pub rating: Option<f64>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ExtensionFields {
    /// Collapse empty strings and empty sequences to `None`.
    ///
    /// Numeric zeroes are kept: a listing with zero installs is data.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for text in [
            &mut self.name,
            &mut self.description,
            &mut self.version,
            &mut self.author,
            &mut self.url,
            &mut self.repository,
        ] {
            *text = text
                .take()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
        }
        self.categories = non_empty_list(self.categories.take());
        self.tags = non_empty_list(self.tags.take());
        self.rating = self.rating.filter(|r| r.is_finite());
        self
    }
}

fn non_empty_list(list: Option<Vec<String>>) -> Option<Vec<String>> {
    let items: Vec<String> = list?
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

/// One stored row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    pub identifier: String,
    #[serde(flatten)]
    pub fields: ExtensionFields,
    pub local_path: Option<String>,
    pub is_created: bool,
}

/// Whether an upsert created the row or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Row counts reported before a rescrape pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: i64,
    pub materialized: i64,
}

impl StoreStats {
    #[must_use]
    pub fn pending(&self) -> i64 {
        self.total - self.materialized
    }
}
