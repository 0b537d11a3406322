//! Search engine module
//!
//! Defines the Engine trait and the search index implementations.

mod traits;

pub mod google_cse;

pub use google_cse::GoogleCustomSearch;
pub use traits::*;
