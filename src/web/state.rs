//! Application state shared across handlers

use crate::aggregate::{AggregateOptions, Aggregator};
use crate::config::Settings;
use crate::engines::GoogleCustomSearch;
use crate::error::ConfigError;
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::search::SearchResultFetcher;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Query aggregator
    pub aggregator: Arc<Aggregator>,
    /// Counters shared with the aggregator and search backend
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wire the search backend, page fetcher and aggregator over one client
    pub fn new(settings: Settings, client: HttpClient) -> Result<Self, ConfigError> {
        settings.validate()?;
        let metrics = Arc::new(Metrics::new());

        let engine = Arc::new(GoogleCustomSearch::with_endpoint(
            settings.search.endpoint.as_str(),
        ));
        let search = SearchResultFetcher::new(client.clone(), engine)
            .with_num_results(settings.search.results_per_query)
            .with_timeout(settings.search.timeout())
            .with_metrics(metrics.clone());

        let aggregator = Aggregator::from_settings(&settings, Arc::new(search), Arc::new(client))?
            .with_metrics(metrics.clone());

        Ok(Self {
            settings: Arc::new(settings),
            aggregator: Arc::new(aggregator),
            metrics,
        })
    }

    /// Build state around an already wired aggregator
    pub fn with_aggregator(settings: Settings, aggregator: Aggregator) -> Self {
        let metrics = aggregator.metrics().clone();
        Self {
            settings: Arc::new(settings),
            aggregator: Arc::new(aggregator),
            metrics,
        }
    }

    /// Aggregation options for a request, falling back to configured defaults
    pub fn options(&self, max_total_chars: Option<usize>) -> AggregateOptions {
        let options = AggregateOptions::from_settings(&self.settings);
        match max_total_chars {
            Some(max) => options.with_max_total_chars(max),
            None => options,
        }
    }
}
