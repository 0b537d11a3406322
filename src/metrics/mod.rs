//! Metrics collection module
//!
//! Tracks aggregation, search and page fetch statistics for the lifetime of
//! the process. Exposed read-only through `GET /stats`.

use crate::results::{FetchOutcome, SkipReason};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Global metrics collector
#[derive(Default)]
pub struct Metrics {
    aggregations: AtomicU64,
    timed_out: AtomicU64,
    searches: AtomicU64,
    search_errors: AtomicU64,
    fetch_successes: AtomicU64,
    fetch_skips: AtomicU64,
    fetch_failures: AtomicU64,
    /// Skips broken down by reason
    skip_reasons: RwLock<HashMap<SkipReason, u64>>,
    /// Recent aggregation durations in ms
    durations: RwLock<Vec<u64>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished aggregation
    pub fn record_aggregation(&self, timed_out: bool, time_ms: u64) {
        self.aggregations.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.timed_out.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut durations) = self.durations.write() {
            // Keep last 100 durations
            if durations.len() >= 100 {
                durations.remove(0);
            }
            durations.push(time_ms);
        }
    }

    pub fn record_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search_error(&self) {
        self.search_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the final outcome of one URL
    pub fn record_fetch(&self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Success(_) => {
                self.fetch_successes.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::Skipped(reason) => {
                self.fetch_skips.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut reasons) = self.skip_reasons.write() {
                    *reasons.entry(*reason).or_insert(0) += 1;
                }
            }
            FetchOutcome::Failed(_) => {
                self.fetch_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Average duration over the recent aggregations
    pub fn avg_aggregation_ms(&self) -> Option<u64> {
        let durations = self.durations.read().ok()?;
        if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<u64>() / durations.len() as u64)
        }
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let skip_reasons = self
            .skip_reasons
            .read()
            .map(|r| {
                r.iter()
                    .map(|(reason, count)| (reason.as_str().to_string(), *count))
                    .collect()
            })
            .unwrap_or_default();

        MetricsSnapshot {
            aggregations: self.aggregations.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            searches: self.searches.load(Ordering::Relaxed),
            search_errors: self.search_errors.load(Ordering::Relaxed),
            fetch_successes: self.fetch_successes.load(Ordering::Relaxed),
            fetch_skips: self.fetch_skips.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            skip_reasons,
            avg_aggregation_ms: self.avg_aggregation_ms(),
        }
    }
}

/// Serializable view of `Metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub aggregations: u64,
    pub timed_out: u64,
    pub searches: u64,
    pub search_errors: u64,
    pub fetch_successes: u64,
    pub fetch_skips: u64,
    pub fetch_failures: u64,
    pub skip_reasons: HashMap<String, u64>,
    pub avg_aggregation_ms: Option<u64>,
}
