//! Content saving utilities for materialized extensions

// Module declarations
mod snapshot;

// Re-export public API from snapshot module
pub use snapshot::{sanitize_folder_name, save_snapshot};
