//! Reconcile scraped detail data and local artifacts against the store.
//!
//! The reconciler performs no retry of its own; callers wrap each call in a
//! `RetryPolicy`.

use std::path::Path;

use super::errors::{StoreError, StoreResult};
use super::record::{ExtensionFields, UpsertOutcome};
use super::ExtensionStore;

/// Upsert-by-identifier front end over an [`ExtensionStore`]
pub struct Reconciler<'a, S: ExtensionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ExtensionStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create the row for `identifier`, or fully replace its scraped fields.
    ///
    /// `is_created` and `local_path` are left as they are.
    pub async fn upsert(
        &self,
        identifier: &str,
        fields: &ExtensionFields,
    ) -> StoreResult<UpsertOutcome> {
        let fields = fields.clone().normalized();
        let outcome = self.store.upsert(identifier, &fields).await?;

        match outcome {
            UpsertOutcome::Created => log::info!("Stored new extension {identifier}"),
            UpsertOutcome::Updated => log::debug!("Refreshed extension {identifier}"),
        }
        Ok(outcome)
    }

    /// Point `identifier` at its local snapshot and flag it as created.
    ///
    /// Idempotent. Fails with [`StoreError::Other`] when the row is missing,
    /// since materialization only runs for rows the store handed out.
    pub async fn mark_materialized(&self, identifier: &str, local_path: &Path) -> StoreResult<()> {
        let local_path = local_path.to_string_lossy();

        if self.store.mark_materialized(identifier, &local_path).await? {
            log::debug!("Materialized {identifier} at {local_path}");
            Ok(())
        } else {
            Err(StoreError::Other(format!(
                "no record for identifier '{identifier}'"
            )))
        }
    }
}
