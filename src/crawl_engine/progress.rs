//! Progress reporting abstraction for harvest runs
//!
//! Defines the `ProgressReporter` trait for lifecycle event reporting
//! and provides a no-op implementation for simple use cases.

use std::path::Path;

use super::crawl_types::{BatchOutcome, ModeReport, SortMode};

/// Trait for reporting harvest progress at key lifecycle events
///
/// Implementations can log, feed a UI, or record events in tests. The
/// engine already logs through the `log` facade; reporters are for callers
/// that need structured progress.
pub trait ProgressReporter: Send + Sync {
    /// Report that a sort mode is about to be explored
    fn report_mode_started(&self, mode: SortMode, url: &str);

    /// Report one finished scroll cycle
    fn report_scroll(&self, mode: SortMode, scroll: u32, empty_streak: u32, new_urls: usize);

    /// Report that a dispatched batch of detail tasks settled
    fn report_batch_completed(&self, mode: SortMode, outcome: BatchOutcome);

    /// Report that a sort mode terminated
    fn report_mode_finished(&self, report: &ModeReport);

    /// Report that an item's snapshot was written and recorded
    fn report_materialized(&self, identifier: &str, path: &Path);

    /// Report that the run completed
    fn report_completed(&self, total_processed: usize);

    /// Report a non-fatal error
    fn report_error(&self, error: &str);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_mode_started(&self, _mode: SortMode, _url: &str) {}

    #[inline(always)]
    fn report_scroll(&self, _mode: SortMode, _scroll: u32, _empty_streak: u32, _new_urls: usize) {}

    #[inline(always)]
    fn report_batch_completed(&self, _mode: SortMode, _outcome: BatchOutcome) {}

    #[inline(always)]
    fn report_mode_finished(&self, _report: &ModeReport) {}

    #[inline(always)]
    fn report_materialized(&self, _identifier: &str, _path: &Path) {}

    #[inline(always)]
    fn report_completed(&self, _total_processed: usize) {}

    #[inline(always)]
    fn report_error(&self, _error: &str) {}
}
