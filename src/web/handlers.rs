//! HTTP request handlers

use super::state::AppState;
use crate::error::{ApiError, ValidationError};
use crate::search::Credentials;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Body of `POST /context`
///
/// Every field is optional at the wire level so that missing fields surface
/// as validation errors instead of generic decoding failures.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextRequest {
    pub queries: Option<Vec<String>>,
    pub api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub max_total_chars: Option<usize>,
}

/// Validated request
#[derive(Debug, Clone, PartialEq)]
pub struct ValidContextRequest {
    pub queries: Vec<String>,
    pub credentials: Credentials,
    pub max_total_chars: Option<usize>,
}

impl ContextRequest {
    /// Check the request before any I/O is started
    pub fn validate(self) -> Result<ValidContextRequest, ValidationError> {
        let queries = match self.queries {
            Some(q) if !q.is_empty() => q,
            _ => return Err(ValidationError::MissingQueries),
        };
        if let Some(index) = queries.iter().position(|q| q.trim().is_empty()) {
            return Err(ValidationError::BlankQuery(index));
        }

        let api_key = required(self.api_key, "apiKey")?;
        let search_engine_id = required(self.search_engine_id, "searchEngineId")?;

        if self.max_total_chars == Some(0) {
            return Err(ValidationError::ZeroBudget);
        }

        Ok(ValidContextRequest {
            queries,
            credentials: Credentials::new(api_key, search_engine_id),
            max_total_chars: self.max_total_chars,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

/// Body returned by `POST /context`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    pub context_data: String,
}

/// Aggregate the requested queries into one corpus
pub async fn context(
    State(state): State<AppState>,
    body: Result<Json<ContextRequest>, JsonRejection>,
) -> Result<Json<ContextResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::Body(e.body_text()))?;
    let request = request.validate()?;

    let options = state.options(request.max_total_chars);
    let result = state
        .aggregator
        .aggregate(&request.queries, &request.credentials, &options)
        .await;

    info!(
        queries = request.queries.len(),
        max_total_chars = options.max_total_chars,
        chars = result.context_data.chars().count(),
        timed_out = result.timed_out,
        "context request served"
    );

    Ok(Json(ContextResponse {
        context_data: result.context_data,
    }))
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

/// Aggregation and fetch counters
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}
