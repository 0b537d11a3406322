//! Search index access
//!
//! Wraps an `Engine` and the HTTP client into a `SearchBackend` that never
//! fails: upstream errors degrade the owning query to an empty candidate list.

mod fetcher;
mod models;

pub use fetcher::{SearchBackend, SearchResultFetcher};
pub use models::*;
