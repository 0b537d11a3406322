//! Search index calls for a single query

use super::models::Credentials;
use crate::engines::{Engine, RequestParams};
use crate::error::SearchError;
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::results::SearchResultItem;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Something that turns a query into an ordered candidate list
///
/// Implementations must not fail: errors are logged and reported as an
/// empty list so they only affect the owning query.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str, credentials: &Credentials) -> Vec<SearchResultItem>;
}

/// Executes engine requests over the shared HTTP client
pub struct SearchResultFetcher {
    client: HttpClient,
    engine: Arc<dyn Engine>,
    num_results: u32,
    timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl SearchResultFetcher {
    pub fn new(client: HttpClient, engine: Arc<dyn Engine>) -> Self {
        Self {
            client,
            engine,
            num_results: crate::MAX_RESULTS_PER_QUERY,
            timeout: Duration::from_secs(10),
            metrics: None,
        }
    }

    /// Set the number of candidates requested per query
    pub fn with_num_results(mut self, num: u32) -> Self {
        self.num_results = num;
        self
    }

    /// Set the timeout of the search call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run the search and surface any upstream error
    pub async fn try_fetch(
        &self,
        query: &str,
        credentials: &Credentials,
    ) -> Result<Vec<SearchResultItem>, SearchError> {
        let params = RequestParams::new(
            query,
            credentials.api_key.as_str(),
            credentials.search_engine_id.as_str(),
        )
        .with_num(self.num_results);

        let request = self.engine.request(&params)?;
        let response = self
            .client
            .execute_with_timeout(request, self.timeout)
            .await?;

        self.engine.response(response)
    }
}

#[async_trait]
impl SearchBackend for SearchResultFetcher {
    async fn search(&self, query: &str, credentials: &Credentials) -> Vec<SearchResultItem> {
        let start = Instant::now();
        let engine = self.engine.name();

        if let Some(ref metrics) = self.metrics {
            metrics.record_search();
        }

        match self.try_fetch(query, credentials).await {
            Ok(items) => {
                debug!(
                    query,
                    engine,
                    results = items.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "search completed"
                );
                items
            }
            Err(e) => {
                warn!(query, engine, error = %e, "search failed, query degrades to empty section");
                if let Some(ref metrics) = self.metrics {
                    metrics.record_search_error();
                }
                Vec::new()
            }
        }
    }
}
