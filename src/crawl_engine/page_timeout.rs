//! Timeout utilities for page operations
//!
//! Every browser call goes through [`with_page_timeout`] so that a hung
//! navigation or evaluation surfaces as [`HarvestError::Timeout`].

use std::future::Future;
use std::time::Duration;

use super::crawl_types::{HarvestError, HarvestResult};

/// Wrap a page operation with an explicit timeout
///
/// # Arguments
/// * `operation` - The async operation to bound
/// * `timeout_secs` - Timeout duration in seconds
/// * `operation_name` - Human-readable name for error messages
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> HarvestResult<T>
where
    F: Future<Output = HarvestResult<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => Err(HarvestError::Timeout {
            operation: operation_name.to_string(),
            secs: timeout_secs,
        }),
    }
}
