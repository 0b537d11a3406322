//! Search query and related data models

use serde::{Deserialize, Serialize};

/// Credentials for the search index, supplied per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    pub search_engine_id: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, search_engine_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            search_engine_id: search_engine_id.into(),
        }
    }
}

/// One query of a request together with its share of the character budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub char_budget: usize,
}

impl SearchQuery {
    /// Split `max_total_chars` evenly across `queries`
    ///
    /// Every query gets `floor(max_total_chars / len(queries))` characters.
    pub fn with_even_budget(queries: &[String], max_total_chars: usize) -> Vec<Self> {
        let budget = char_budget(max_total_chars, queries.len());
        queries
            .iter()
            .map(|q| Self {
                text: q.clone(),
                char_budget: budget,
            })
            .collect()
    }
}

/// Per-query character budget; zero when there are no queries
pub fn char_budget(max_total_chars: usize, num_queries: usize) -> usize {
    if num_queries == 0 {
        0
    } else {
        max_total_chars / num_queries
    }
}
