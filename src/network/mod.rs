//! HTTP networking module
//!
//! Provides the shared outbound client used by the provider adapters.

mod client;

pub use client::{HttpClient, ProviderRequest, ProviderResponse};
