//! HTTP networking module
//!
//! Provides the outgoing HTTP client used for both search index calls and page
//! fetches, the browser-emulating header profile and the process-wide DNS cache.

mod client;
mod dns;
mod types;
mod user_agent;

pub use client::HttpClient;
pub use dns::CachingResolver;
pub use types::{is_textual, HttpRequest, HttpResponse};
pub use user_agent::{accept_html, accept_language, generate_user_agent};

use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// Source of raw page responses
///
/// `HttpClient` is the production implementation; tests substitute scripted
/// sources to control statuses, bodies and timing.
#[async_trait]
pub trait PageClient: Send + Sync {
    /// Issue a single GET for `url`, bounded by `timeout`
    async fn get_page(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TransportError>;
}
