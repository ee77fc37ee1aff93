//! Result types passed between the provider clients and the caller
//!
//! Hits are transient: they live for one request and are never persisted.

mod types;

pub use types::*;
