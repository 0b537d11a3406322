//! Result type definitions

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate page returned by the search index
///
/// Order of items is the order returned by the index and is preserved
/// through filtering, fetching and assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub title: String,
    pub link: String,
}

impl SearchResultItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Readable text of a page plus its same-origin outbound links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub text: String,
    pub links: Vec<String>,
}

/// Why a page was fetched but not used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnsupportedContentType,
    NotValidHtml,
    InsufficientContent,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedContentType => "unsupported content-type",
            Self::NotValidHtml => "not valid HTML",
            Self::InsufficientContent => "insufficient content",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of fetching a single URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(ExtractedPage),
    Skipped(SkipReason),
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }

    pub fn into_page(self) -> Option<ExtractedPage> {
        match self {
            Self::Success(page) => Some(page),
            _ => None,
        }
    }
}

/// The assembled, budget-respecting text block of one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySection {
    pub query: String,
    pub text: String,
    /// Length of `text` in characters
    pub used_chars: usize,
}

impl QuerySection {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            text: String::new(),
            used_chars: 0,
        }
    }

    /// Append `record` if it fits in `budget`; never appends partially
    pub fn try_push(&mut self, record: &str, budget: usize) -> bool {
        let len = record.chars().count();
        if self.used_chars + len > budget {
            return false;
        }
        self.text.push_str(record);
        self.used_chars += len;
        true
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Final result of one aggregation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// One section per input query, in input order
    pub sections: Vec<QuerySection>,
    /// Concatenated sections, hard-truncated to the global budget
    pub context_data: String,
    /// Whether the global deadline expired before every query finished
    pub timed_out: bool,
}

impl AggregationResult {
    pub fn empty() -> Self {
        Self {
            sections: vec![],
            context_data: String::new(),
            timed_out: false,
        }
    }
}
