//! Materialization pass over records that have no local snapshot yet

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{info, warn};

use super::batch_executor::BatchExecutor;
use super::crawl_types::{HarvestError, HarvestResult, RescrapeReport};
use super::progress::ProgressReporter;
use super::retry::RetryPolicy;
use crate::store::{ExtensionFields, ExtensionRecord, ExtensionStore, Reconciler};

/// What a materializer produced for one record
#[derive(Debug, Clone)]
pub struct Materialized {
    /// Attributes scraped from the live detail page
    pub fields: ExtensionFields,
    /// Absolute folder holding the snapshot
    pub path: PathBuf,
}

/// Re-reads a record's detail page and writes a local artifact for it
#[async_trait]
pub trait Materializer: Send + Sync {
    async fn materialize(
        &self,
        record: &ExtensionRecord,
        url: &str,
        save_dir: &Path,
    ) -> HarvestResult<Materialized>;
}

/// Snapshot every incomplete record, most downloaded first, refresh its
/// scraped fields and flag it created.
///
/// Records without a URL count as failed. Store errors that outlast the retry
/// policy while listing records abort the pass; per-record failures do not.
pub async fn rescrape_incomplete<S, M, P>(
    store: &S,
    materializer: &M,
    save_dir: &Path,
    concurrency: usize,
    retry: RetryPolicy,
    progress: &P,
) -> HarvestResult<RescrapeReport>
where
    S: ExtensionStore + ?Sized,
    M: Materializer,
    P: ProgressReporter,
{
    let executor = BatchExecutor::new(concurrency)?;

    let stats = retry.run("Store statistics", || store.stats()).await?;
    info!(
        "Store holds {} extensions, {} already saved locally",
        stats.total, stats.materialized
    );

    let records = retry.run("Incomplete records", || store.incomplete()).await?;
    if records.is_empty() {
        info!("No extensions waiting for a snapshot");
        progress.report_completed(0);
        return Ok(RescrapeReport::default());
    }
    info!("{} extensions waiting for a snapshot", records.len());

    tokio::fs::create_dir_all(save_dir).await?;
    let save_dir = tokio::fs::canonicalize(save_dir).await?;
    info!("Saving snapshots under {}", save_dir.display());

    let total = records.len();
    let reconciler = Reconciler::new(store);
    let save_dir = save_dir.as_path();
    let reconciler = &reconciler;

    let outcome = executor
        .run(records, |record| async move {
            let result = materialize_one(&record, materializer, save_dir, reconciler, retry).await;
            match &result {
                Ok(path) => progress.report_materialized(&record.identifier, path),
                Err(e) => {
                    warn!("Failed to save {}: {e}", record.identifier);
                    progress.report_error(&format!("{}: {e}", record.identifier));
                }
            }
            result
        })
        .await;

    let report = RescrapeReport {
        total,
        processed: outcome.succeeded,
        failed: outcome.failed,
    };
    info!(
        "Rescrape complete: {} processed, {} failed, {}% success rate",
        report.processed,
        report.failed,
        report.success_rate()
    );
    progress.report_completed(report.processed);
    Ok(report)
}

async fn materialize_one<S, M>(
    record: &ExtensionRecord,
    materializer: &M,
    save_dir: &Path,
    reconciler: &Reconciler<'_, S>,
    retry: RetryPolicy,
) -> HarvestResult<PathBuf>
where
    S: ExtensionStore + ?Sized,
    M: Materializer,
{
    let url = record.fields.url.as_deref().ok_or_else(|| {
        HarvestError::Extraction(format!("record {} has no URL", record.identifier))
    })?;

    let Materialized { fields, path } = materializer.materialize(record, url, save_dir).await?;

    let identifier = record.identifier.as_str();
    let fields = &fields;
    retry
        .run("Upsert", || reconciler.upsert(identifier, fields))
        .await?;

    let path_ref = path.as_path();
    retry
        .run("Mark materialized", || {
            reconciler.mark_materialized(identifier, path_ref)
        })
        .await?;
    Ok(path)
}
