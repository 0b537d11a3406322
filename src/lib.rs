//! search-context: turns a set of free-text search queries into a single
//! character-bounded text corpus.
//!
//! For each query the service asks a search index for candidate pages, fetches
//! them concurrently with bounded retries, extracts readable text and folds the
//! results into per-query sections under a global character budget and a
//! global deadline.

pub mod aggregate;
pub mod config;
pub mod engines;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod filter;
pub mod metrics;
pub mod network;
pub mod results;
pub mod search;
pub mod web;

pub use aggregate::{AggregateOptions, Aggregator};
pub use config::Settings;
pub use results::{AggregationResult, FetchOutcome, QuerySection, SearchResultItem};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default global character budget when a request does not provide one
pub const DEFAULT_MAX_TOTAL_CHARS: usize = 200_000;

/// Maximum number of results the search index returns per call
pub const MAX_RESULTS_PER_QUERY: u32 = 10;
