//! Configuration module for harvest runs
//!
//! This module provides the `HarvestConfig` struct and its type-safe builder
//! for configuring discovery and rescrape runs with validation and sensible
//! defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{HarvestConfigBuilder, WithDatabasePath, WithListingUrl};
pub use types::{HarvestConfig, PageTimeouts};
