//! Wave-based bounded concurrency
//!
//! Items are split into waves of at most `limit`; every task of a wave runs
//! concurrently and the next wave starts only after all of them settle.
//! Peak concurrency therefore never exceeds `limit`.

use std::fmt::Display;
use std::future::Future;

use futures::future::join_all;
use log::{debug, info};

use super::crawl_types::{BatchOutcome, HarvestError, HarvestResult};

#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    limit: usize,
}

impl BatchExecutor {
    /// Fails with [`HarvestError::Config`] when `limit` is zero.
    pub fn new(limit: usize) -> HarvestResult<Self> {
        if limit == 0 {
            return Err(HarvestError::Config(
                "batch concurrency limit must be at least 1".into(),
            ));
        }
        Ok(Self { limit })
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `task` over every item, wave by wave.
    ///
    /// A failing task is counted and logged at debug level; it never aborts
    /// its wave. Tasks log their own failures with item context.
    pub async fn run<I, T, E, F, Fut>(&self, items: Vec<I>, task: F) -> BatchOutcome
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut outcome = BatchOutcome::default();
        let total = items.len();
        let mut items = items.into_iter();
        let mut wave_index = 0usize;

        loop {
            let wave: Vec<I> = items.by_ref().take(self.limit).collect();
            if wave.is_empty() {
                break;
            }
            wave_index += 1;
            let wave_size = wave.len();

            let results = join_all(wave.into_iter().map(&task)).await;

            let mut wave_outcome = BatchOutcome::default();
            for result in results {
                match result {
                    Ok(_) => wave_outcome.succeeded += 1,
                    Err(e) => {
                        debug!("Wave {wave_index}: task failed: {e}");
                        wave_outcome.failed += 1;
                    }
                }
            }

            debug!(
                "Wave {wave_index} settled: {}/{wave_size} succeeded",
                wave_outcome.succeeded
            );
            outcome.absorb(wave_outcome);
        }

        if total > 0 {
            info!(
                "Batch of {total} finished: {} succeeded, {} failed",
                outcome.succeeded, outcome.failed
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_is_rejected() {
        assert!(matches!(BatchExecutor::new(0), Err(HarvestError::Config(_))));
    }

    #[tokio::test]
    async fn failures_are_counted_not_raised() {
        let executor = BatchExecutor::new(2).expect("valid limit");
        let outcome = executor
            .run((0..5).collect(), |n: u32| async move {
                if n % 2 == 0 { Ok(n) } else { Err(format!("odd {n}")) }
            })
            .await;

        assert_eq!(outcome.succeeded, 3);
        assert_eq!(outcome.failed, 2);
    }

    #[tokio::test]
    async fn empty_input_runs_nothing() {
        let executor = BatchExecutor::new(3).expect("valid limit");
        let outcome = executor
            .run(Vec::<u32>::new(), |_| async { Ok::<_, String>(()) })
            .await;
        assert_eq!(outcome, BatchOutcome::default());
    }
}
