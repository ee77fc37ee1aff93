//! askweb: web search answered by a language model
//!
//! A query is sent to a hosted search API, the hits are summarized by a
//! hosted completion API, and each successful search is charged against the
//! user's plan.

pub mod auth;
pub mod config;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod results;
pub mod search;
pub mod store;
pub mod usage;
pub mod web;

pub use config::Settings;
pub use results::{AnswerResponse, SearchHit, Source};
pub use search::{Orchestrator, SearchError, SearchOptions, SearchPayload};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
