//! Durable extension store
//!
//! The crawl engine talks to storage only through [`ExtensionStore`]; the
//! SQLite implementation lives in [`sqlite`]. Errors are categorized so a
//! `RetryPolicy` can tell busy/lock contention from real failures.

use std::collections::HashSet;

use async_trait::async_trait;

pub mod errors;
pub mod reconciler;
pub mod record;
pub mod sqlite;

pub use errors::{StoreError, StoreResult};
pub use reconciler::Reconciler;
pub use record::{ExtensionFields, ExtensionRecord, StoreStats, UpsertOutcome};
pub use sqlite::SqliteExtensionStore;

/// Key-value style store of extension records keyed by identifier
#[async_trait]
pub trait ExtensionStore: Send + Sync {
    /// Point lookup by identifier
    async fn find(&self, identifier: &str) -> StoreResult<Option<ExtensionRecord>>;

    /// Which of `identifiers` already have a row
    async fn existing_identifiers(&self, identifiers: &[String]) -> StoreResult<HashSet<String>>;

    /// Insert, or fully replace the scraped attributes of, the row for `identifier`.
    ///
    /// Never touches `local_path` or `is_created`.
    async fn upsert(&self, identifier: &str, fields: &ExtensionFields)
    -> StoreResult<UpsertOutcome>;

    /// Record a local artifact for `identifier` and flag the row as created.
    ///
    /// Returns `false` when no row exists for `identifier`.
    async fn mark_materialized(&self, identifier: &str, local_path: &str) -> StoreResult<bool>;

    /// Rows still waiting for materialization, most downloaded first
    async fn incomplete(&self) -> StoreResult<Vec<ExtensionRecord>>;

    /// Total and materialized row counts
    async fn stats(&self) -> StoreResult<StoreStats>;
}
