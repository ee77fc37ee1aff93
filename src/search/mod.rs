//! Search orchestration module
//!
//! Validates a search request, runs the search and completion providers in
//! sequence and charges the user's usage.

mod error;
mod models;
mod orchestrator;

pub use error::SearchError;
pub use models::*;
pub use orchestrator::Orchestrator;
