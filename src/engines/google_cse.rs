//! Google Custom Search JSON API

use super::traits::*;
use crate::error::SearchError;
use crate::network::{HttpRequest, HttpResponse};
use crate::results::SearchResultItem;
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Google Programmable Search Engine, queried through its JSON API
pub struct GoogleCustomSearch {
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    items: Option<Vec<ApiItem>>,
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    title: Option<String>,
    link: Option<String>,
}

impl GoogleCustomSearch {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            base_url: endpoint.into(),
        }
    }
}

impl Default for GoogleCustomSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for GoogleCustomSearch {
    fn name(&self) -> &str {
        "google_cse"
    }

    fn request(&self, params: &RequestParams) -> Result<HttpRequest, SearchError> {
        if params.api_key.is_empty() || params.engine_id.is_empty() {
            return Err(SearchError::Request("missing API credentials".to_string()));
        }

        let num = params.num.clamp(1, self.results_per_page());

        Ok(HttpRequest::get(&self.base_url)
            .header("Accept", "application/json")
            .param("key", &params.api_key)
            .param("cx", &params.engine_id)
            .param("q", &params.query)
            .param("num", num.to_string()))
    }

    fn response(&self, response: HttpResponse) -> Result<Vec<SearchResultItem>, SearchError> {
        if !response.is_success() {
            return Err(SearchError::Status(response.status));
        }

        let body: ApiResponse = response
            .json()
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        // Items without a title or link are dropped rather than passed on half-empty
        let items = body
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                let link = item.link.filter(|l| !l.trim().is_empty())?;
                let title = item.title.filter(|t| !t.trim().is_empty())?;
                Some(SearchResultItem::new(title.trim(), link.trim()))
            })
            .collect();

        Ok(items)
    }
}
