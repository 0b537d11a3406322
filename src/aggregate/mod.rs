//! Budgeted multi-query aggregation
//!
//! Drives, for every query concurrently: search, URL filtering, concurrent
//! page fetches and budgeted assembly; then composes all sections under one
//! global deadline and one global character budget.
//!
//! Failures only ever shrink the output. A failed page drops its record, a
//! failed search leaves an empty section, and an expired deadline leaves
//! empty sections for the queries still running.

mod compose;

pub use compose::{compose, format_record, truncate_chars, wrap_section, SECTION_SEPARATOR};

use crate::config::Settings;
use crate::error::ConfigError;
use crate::extract::ContentExtractor;
use crate::fetcher::ContentFetcher;
use crate::filter::UrlFilter;
use crate::metrics::Metrics;
use crate::network::PageClient;
use crate::results::{AggregationResult, QuerySection, SearchResultItem};
use crate::search::{Credentials, SearchBackend, SearchQuery};
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Budgets and deadlines of one aggregation
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    /// Upper bound on the length of `context_data`, in characters
    pub max_total_chars: usize,
    /// Timeout of each individual page fetch attempt
    pub per_attempt_timeout: Duration,
    /// Deadline of the whole aggregation
    pub global_timeout: Duration,
}

impl AggregateOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_total_chars: settings.aggregation.default_max_total_chars,
            per_attempt_timeout: settings.fetch.per_attempt_timeout(),
            global_timeout: settings.aggregation.global_timeout(),
        }
    }

    pub fn with_max_total_chars(mut self, max_total_chars: usize) -> Self {
        self.max_total_chars = max_total_chars;
        self
    }
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Turns queries into one bounded text corpus
pub struct Aggregator {
    search: Arc<dyn SearchBackend>,
    fetcher: ContentFetcher,
    filter: Arc<UrlFilter>,
    metrics: Arc<Metrics>,
}

impl Aggregator {
    pub fn new(
        search: Arc<dyn SearchBackend>,
        fetcher: ContentFetcher,
        filter: Arc<UrlFilter>,
    ) -> Self {
        Self {
            search,
            fetcher,
            filter,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Build the filter, extractor and fetcher from settings
    pub fn from_settings(
        settings: &Settings,
        search: Arc<dyn SearchBackend>,
        pages: Arc<dyn PageClient>,
    ) -> Result<Self, ConfigError> {
        let filter = Arc::new(UrlFilter::new(&settings.filter)?);
        let extractor = Arc::new(ContentExtractor::new(
            &settings.extraction,
            &settings.filter,
        )?);
        let fetcher = ContentFetcher::with_settings(pages, extractor, &settings.fetch);

        Ok(Self::new(search, fetcher, filter))
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Aggregate `queries` into one corpus of at most `max_total_chars`
    ///
    /// Never fails: the worst case is a result made of empty sections.
    pub async fn aggregate(
        &self,
        queries: &[String],
        credentials: &Credentials,
        options: &AggregateOptions,
    ) -> AggregationResult {
        let request_id = Uuid::new_v4();
        let span = info_span!("aggregate", %request_id, queries = queries.len());
        self.run(queries, credentials, options)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        queries: &[String],
        credentials: &Credentials,
        options: &AggregateOptions,
    ) -> AggregationResult {
        if queries.is_empty() {
            return AggregationResult::empty();
        }

        let start = Instant::now();
        let deadline = start + options.global_timeout;
        let plan = SearchQuery::with_even_budget(queries, options.max_total_chars);

        let mut sections: Vec<Option<QuerySection>> = vec![None; plan.len()];
        let mut pending: FuturesUnordered<_> = plan
            .iter()
            .enumerate()
            .map(|(index, query)| async move {
                let section = self
                    .assemble_query(query, credentials, options.per_attempt_timeout)
                    .await;
                (index, section)
            })
            .collect();

        let timed_out = loop {
            match timeout_at(deadline, pending.next()).await {
                Ok(Some((index, section))) => sections[index] = Some(section),
                Ok(None) => break false,
                Err(_) => break true,
            }
        };

        // Queries still running are cancelled together with their requests
        let unfinished = pending.len();
        drop(pending);

        let sections: Vec<QuerySection> = sections
            .into_iter()
            .zip(&plan)
            .map(|(section, query)| section.unwrap_or_else(|| QuerySection::empty(&query.text)))
            .collect();

        let context_data = compose(&sections, options.max_total_chars);
        let elapsed = start.elapsed();

        info!(
            timed_out,
            unfinished,
            chars = context_data.chars().count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "aggregation finished"
        );
        self.metrics
            .record_aggregation(timed_out, elapsed.as_millis() as u64);

        AggregationResult {
            sections,
            context_data,
            timed_out,
        }
    }

    /// Search, filter, fetch and fold one query into its section
    async fn assemble_query(
        &self,
        query: &SearchQuery,
        credentials: &Credentials,
        per_attempt_timeout: Duration,
    ) -> QuerySection {
        let items = self.search.search(&query.text, credentials).await;
        let found = items.len();

        let candidates: Vec<SearchResultItem> = items
            .into_iter()
            .filter(|item| {
                let fetchable = self.filter.is_fetchable(&item.link);
                if !fetchable {
                    debug!(query = %query.text, link = %item.link, "candidate filtered out");
                }
                fetchable
            })
            .collect();

        // join_all yields outcomes in candidate order, not completion order
        let outcomes = join_all(
            candidates
                .iter()
                .map(|item| self.fetcher.fetch(&item.link, per_attempt_timeout)),
        )
        .await;

        for outcome in &outcomes {
            self.metrics.record_fetch(outcome);
        }

        let mut section = QuerySection::empty(&query.text);
        let mut included = 0usize;

        let pages = candidates
            .iter()
            .zip(outcomes)
            .filter_map(|(item, outcome)| outcome.into_page().map(|page| (item, page)));

        for (item, page) in pages {
            let record = format_record(item, &page.text);
            if !section.try_push(&record, query.char_budget) {
                // Stop at the first overflow; later records are not considered
                debug!(
                    query = %query.text,
                    link = %item.link,
                    used = section.used_chars,
                    budget = query.char_budget,
                    "query budget reached"
                );
                break;
            }
            included += 1;
        }

        debug!(
            query = %query.text,
            found,
            fetched = candidates.len(),
            included,
            chars = section.used_chars,
            "query assembled"
        );

        section
    }
}
