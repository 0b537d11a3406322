//! Engine traits and types

use crate::error::SearchError;
use crate::network::{HttpRequest, HttpResponse};
use crate::results::SearchResultItem;

/// Parameters for building a search request
#[derive(Debug, Clone)]
pub struct RequestParams {
    /// Search query string
    pub query: String,
    /// API key of the search index
    pub api_key: String,
    /// Identifier of the configured search engine
    pub engine_id: String,
    /// Number of results to request
    pub num: u32,
}

impl RequestParams {
    /// Create new request parameters
    pub fn new(
        query: impl Into<String>,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            num: crate::MAX_RESULTS_PER_QUERY,
        }
    }

    pub fn with_num(mut self, num: u32) -> Self {
        self.num = num;
        self
    }
}

/// A search index that turns a query into an ordered list of candidates
///
/// Engines only build requests and parse responses; the HTTP exchange itself
/// is driven by `SearchResultFetcher`.
pub trait Engine: Send + Sync {
    /// Engine name
    fn name(&self) -> &str;

    /// Maximum number of results a single call may return
    fn results_per_page(&self) -> u32 {
        10
    }

    /// Build the HTTP request for a search
    fn request(&self, params: &RequestParams) -> Result<HttpRequest, SearchError>;

    /// Parse the HTTP response into candidates, in index order
    fn response(&self, response: HttpResponse) -> Result<Vec<SearchResultItem>, SearchError>;
}
