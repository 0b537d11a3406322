//! Result types shared by the fetch and aggregation pipeline
//!
//! All of these are request-scoped: they are created and consumed within a
//! single aggregation call.

mod types;

pub use types::*;
