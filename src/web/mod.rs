//! Web server module
//!
//! Thin HTTP surface over the aggregator: request validation, JSON
//! encoding and health/stats endpoints.

mod handlers;
mod routes;
mod state;

pub use handlers::{ContextRequest, ContextResponse, ValidContextRequest};
pub use routes::create_router;
pub use state::AppState;
