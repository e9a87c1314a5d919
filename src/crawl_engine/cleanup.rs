//! Browser and resource cleanup functionality
//!
//! Runs after a harvest finishes or fails, before the process exits.

use std::path::PathBuf;

use chromiumoxide::Browser;
use log::{debug, warn};
use tokio::task::JoinHandle;

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

/// Close the browser, wait for its process, then remove its profile directory.
///
/// The CDP handler task is aborted last, after the browser has exited.
pub async fn cleanup_browser_and_data(
    mut browser: Browser,
    handler: JoinHandle<()>,
    chrome_data_dir: PathBuf,
) -> CleanupResult {
    let mut errors = Vec::new();

    debug!(target: "marketscrape::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "marketscrape::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    }

    // Wait for browser process to fully exit (prevents "not closed manually" warning)
    if let Err(e) = browser.wait().await {
        warn!(target: "marketscrape::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    }

    handler.abort();
    if let Err(e) = handler.await
        && !e.is_cancelled()
    {
        warn!(target: "marketscrape::cleanup", "Handler task failed during abort: {e}");
        errors.push(format!("Handler task failed: {e}"));
    }

    if let Err(e) = tokio::fs::remove_dir_all(&chrome_data_dir).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(target: "marketscrape::cleanup", "Failed to clean up Chrome data directory: {e}");
        errors.push(format!("Directory cleanup failed: {e}"));
    }

    if errors.is_empty() {
        debug!(target: "marketscrape::cleanup", "Browser and data cleanup completed successfully");
        CleanupResult::Success
    } else {
        CleanupResult::PartialFailure(errors)
    }
}
