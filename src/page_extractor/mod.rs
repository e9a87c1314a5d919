//! Page data extraction for listing and detail pages.
//!
//! Listing pages yield candidate detail URLs; detail pages yield the raw
//! field text that `schema` turns into store fields.

// Sub-modules
pub mod detail;
pub mod extractors;
pub mod js_scripts;
pub mod schema;

// Re-exports for public API
pub use detail::ChromiumDetailFetcher;
pub use extractors::{CandidateExtractor, ChromiumListing, navigate, wait_for_selector};
pub use schema::{RawExtensionDetail, SelectorHits, parse_count, parse_date, parse_rating};
