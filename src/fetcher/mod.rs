//! Page fetching with bounded retries
//!
//! `ContentFetcher` turns one URL into a `FetchOutcome`:
//!
//! - up to `max_attempts` GETs, each bounded by the per-attempt timeout
//! - exponential backoff before each retry, retrying only on
//!   429/502/503/504, connection resets/refusals and timeouts
//! - content-type and markup gates, then text extraction
//! - pages with too little text are skipped instead of succeeding
//!
//! Every attempt emits exactly one log record.

mod retry;

pub use retry::RetryPolicy;

use crate::config::FetchSettings;
use crate::error::FetchError;
use crate::extract::ContentExtractor;
use crate::network::{is_textual, HttpResponse, PageClient};
use crate::results::{FetchOutcome, SkipReason};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Fetches one page and extracts its text
#[derive(Clone)]
pub struct ContentFetcher {
    client: Arc<dyn PageClient>,
    extractor: Arc<ContentExtractor>,
    policy: RetryPolicy,
    min_content_chars: usize,
}

impl ContentFetcher {
    pub fn new(client: Arc<dyn PageClient>, extractor: Arc<ContentExtractor>) -> Self {
        Self::with_settings(client, extractor, &FetchSettings::default())
    }

    pub fn with_settings(
        client: Arc<dyn PageClient>,
        extractor: Arc<ContentExtractor>,
        settings: &FetchSettings,
    ) -> Self {
        Self {
            client,
            extractor,
            policy: RetryPolicy::from_settings(settings),
            min_content_chars: settings.min_content_chars,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `url`, retrying transient failures
    pub async fn fetch(&self, url: &str, per_attempt_timeout: Duration) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts;
        let mut last_error = FetchError::Timeout(per_attempt_timeout);

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.policy.backoff(attempt - 1);
                debug!(url, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                sleep(delay).await;
            }

            // Dropping the attempt future on timeout aborts the request
            let result = match timeout(
                per_attempt_timeout,
                self.client.get_page(url, per_attempt_timeout),
            )
            .await
            {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(e)) => Err(FetchError::Transport(e)),
                Err(_) => Err(FetchError::Timeout(per_attempt_timeout)),
            };

            let error = match result {
                Ok(response) if response.is_success() => {
                    let outcome = self.evaluate(url, &response);
                    let reason = match &outcome {
                        FetchOutcome::Skipped(reason) => reason.as_str(),
                        _ => "",
                    };
                    info!(
                        url,
                        attempt,
                        status = response.status,
                        content_type = response.content_type().unwrap_or(""),
                        outcome = outcome.label(),
                        reason,
                        "fetch attempt"
                    );
                    return outcome;
                }
                Ok(response) => {
                    let error = FetchError::Status(response.status);
                    warn!(
                        url,
                        attempt,
                        status = response.status,
                        content_type = response.content_type().unwrap_or(""),
                        outcome = "failed",
                        retryable = error.is_retryable(&self.policy.retryable_statuses),
                        "fetch attempt"
                    );
                    error
                }
                Err(error) => {
                    warn!(
                        url,
                        attempt,
                        status = 0u16,
                        content_type = "",
                        outcome = "failed",
                        retryable = error.is_retryable(&self.policy.retryable_statuses),
                        error = %error,
                        "fetch attempt"
                    );
                    error
                }
            };

            if !error.is_retryable(&self.policy.retryable_statuses) {
                return FetchOutcome::Failed(error);
            }
            last_error = error;
        }

        FetchOutcome::Failed(last_error)
    }

    /// Apply the content gates to a 2xx response and extract its text
    fn evaluate(&self, url: &str, response: &HttpResponse) -> FetchOutcome {
        if !response.content_type().map(is_textual).unwrap_or(false) {
            return FetchOutcome::Skipped(SkipReason::UnsupportedContentType);
        }

        if !has_markup(&response.text) {
            return FetchOutcome::Skipped(SkipReason::NotValidHtml);
        }

        // Links resolve against the final URL after redirects
        let page_url = if response.url.is_empty() {
            url
        } else {
            response.url.as_str()
        };
        let page = self.extractor.extract(&response.text, page_url);

        if page.text.chars().count() < self.min_content_chars {
            return FetchOutcome::Skipped(SkipReason::InsufficientContent);
        }

        FetchOutcome::Success(page)
    }
}

/// At least one `<` followed somewhere later by `>`
fn has_markup(body: &str) -> bool {
    body.find('<')
        .map(|open| body[open..].contains('>'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractionSettings, FilterSettings};
    use crate::error::TransportError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    enum Step {
        Respond(HttpResponse),
        Error(TransportError),
        Hang,
    }

    /// Plays back a fixed sequence of responses and records call times
    struct ScriptedClient {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedClient {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageClient for ScriptedClient {
        async fn get_page(
            &self,
            _url: &str,
            _timeout: Duration,
        ) -> Result<HttpResponse, TransportError> {
            self.calls.lock().unwrap().push(Instant::now());
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Respond(resp)) => Ok(resp),
                Some(Step::Error(e)) => Err(e),
                Some(Step::Hang) | None => std::future::pending().await,
            }
        }
    }

    fn article() -> String {
        let body = "Rust ownership model guarantees memory safety without garbage collection. "
            .repeat(5);
        format!("<html><body><article><p>{}</p></article></body></html>", body)
    }

    fn html(status: u16) -> Step {
        Step::Respond(HttpResponse::new(status, Some("text/html; charset=utf-8"), article()))
    }

    fn fetcher(client: Arc<ScriptedClient>) -> ContentFetcher {
        let extractor = ContentExtractor::new(
            &ExtractionSettings::default(),
            &FilterSettings::default(),
        )
        .unwrap();
        ContentFetcher::new(client, Arc::new(extractor))
    }

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn test_retries_503_with_backoff() {
        let client = ScriptedClient::new(vec![html(503), html(503), html(200)]);
        let outcome = fetcher(client.clone())
            .fetch("https://example.com/a", TIMEOUT)
            .await;

        assert!(outcome.is_success());
        let calls = client.call_times();
        assert_eq!(calls.len(), 3);

        let first_gap = calls[1] - calls[0];
        let second_gap = calls[2] - calls[1];
        assert!(first_gap >= Duration::from_secs(2) && first_gap < Duration::from_millis(2100));
        assert!(second_gap >= Duration::from_secs(4) && second_gap < Duration::from_millis(4100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        let client = ScriptedClient::new(vec![html(503), html(502), html(504), html(200)]);
        let outcome = fetcher(client.clone())
            .fetch("https://example.com/a", TIMEOUT)
            .await;

        assert_eq!(outcome, FetchOutcome::Failed(FetchError::Status(504)));
        assert_eq!(client.call_times().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_status_fails_immediately() {
        let client = ScriptedClient::new(vec![html(404), html(200)]);
        let outcome = fetcher(client.clone())
            .fetch("https://example.com/a", TIMEOUT)
            .await;

        assert_eq!(outcome, FetchOutcome::Failed(FetchError::Status(404)));
        assert_eq!(client.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pdf_is_skipped_after_one_attempt() {
        let client = ScriptedClient::new(vec![Step::Respond(HttpResponse::new(
            200,
            Some("application/pdf"),
            "%PDF-1.7 <binary>",
        ))]);
        let outcome = fetcher(client.clone())
            .fetch("https://example.com/paper", TIMEOUT)
            .await;

        assert_eq!(
            outcome,
            FetchOutcome::Skipped(SkipReason::UnsupportedContentType)
        );
        assert_eq!(client.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_content_type_is_skipped() {
        let client = ScriptedClient::new(vec![Step::Respond(HttpResponse::new(
            200,
            None,
            article(),
        ))]);
        let outcome = fetcher(client).fetch("https://example.com/a", TIMEOUT).await;
        assert_eq!(
            outcome,
            FetchOutcome::Skipped(SkipReason::UnsupportedContentType)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_body_without_markup_is_skipped() {
        let client = ScriptedClient::new(vec![Step::Respond(HttpResponse::new(
            200,
            Some("text/plain"),
            "just some plain words > nothing else",
        ))]);
        let outcome = fetcher(client.clone())
            .fetch("https://example.com/a", TIMEOUT)
            .await;
        assert_eq!(outcome, FetchOutcome::Skipped(SkipReason::NotValidHtml));
        assert_eq!(client.call_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_page_is_insufficient() {
        let client = ScriptedClient::new(vec![Step::Respond(HttpResponse::new(
            200,
            Some("text/html"),
            "<html><body><p>Too short to matter.</p></body></html>",
        ))]);
        let outcome = fetcher(client).fetch("https://example.com/a", TIMEOUT).await;
        assert_eq!(
            outcome,
            FetchOutcome::Skipped(SkipReason::InsufficientContent)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_is_retried() {
        let client = ScriptedClient::new(vec![Step::Hang, html(200)]);
        let start = Instant::now();
        let outcome = fetcher(client.clone())
            .fetch("https://example.com/a", Duration::from_secs(5))
            .await;

        assert!(outcome.is_success());
        assert_eq!(client.call_times().len(), 2);
        // 5s timed-out attempt + 2s backoff
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(7) && elapsed < Duration::from_millis(7100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_time_out() {
        let client = ScriptedClient::new(vec![Step::Hang, Step::Hang, Step::Hang]);
        let outcome = fetcher(client.clone())
            .fetch("https://example.com/a", Duration::from_secs(1))
            .await;

        assert_eq!(
            outcome,
            FetchOutcome::Failed(FetchError::Timeout(Duration::from_secs(1)))
        );
        assert_eq!(client.call_times().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_reset_is_retried() {
        let client = ScriptedClient::new(vec![
            Step::Error(TransportError::ConnectionReset),
            html(200),
        ]);
        let outcome = fetcher(client.clone())
            .fetch("https://example.com/a", TIMEOUT)
            .await;
        assert!(outcome.is_success());
        assert_eq!(client.call_times().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_transport_error_fails_immediately() {
        let client = ScriptedClient::new(vec![
            Step::Error(TransportError::Other("invalid certificate".into())),
            html(200),
        ]);
        let outcome = fetcher(client.clone())
            .fetch("https://example.com/a", TIMEOUT)
            .await;
        assert!(matches!(
            outcome,
            FetchOutcome::Failed(FetchError::Transport(TransportError::Other(_)))
        ));
        assert_eq!(client.call_times().len(), 1);
    }

    #[test]
    fn test_has_markup() {
        assert!(has_markup("<p>x</p>"));
        assert!(has_markup("a < b > c"));
        assert!(!has_markup("no tags here"));
        assert!(!has_markup("> before <"));
    }
}
