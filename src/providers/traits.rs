//! Provider traits and errors

use crate::results::{AnswerResponse, SearchHit};
use crate::search::SearchDepth;
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single provider call
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The credential for the provider is not configured
    #[error("{provider}: API key is not configured")]
    MissingCredential { provider: String },

    #[error("{provider}: request timed out")]
    Timeout { provider: String },

    /// Non-success HTTP status; `body` is for server-side logs only
    #[error("{provider}: HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider}: transport error: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: unexpected response: {message}")]
    Decode { provider: String, message: String },
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }

    /// Configuration errors are a kind of upstream failure
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProviderError::MissingCredential { .. })
    }

    pub fn provider(&self) -> &str {
        match self {
            ProviderError::MissingCredential { provider }
            | ProviderError::Timeout { provider }
            | ProviderError::Status { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::Decode { provider, .. } => provider,
        }
    }
}

/// Web search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Run one search and return the ranked hits unmodified
    async fn search(
        &self,
        query: &str,
        depth: SearchDepth,
        max_results: u8,
    ) -> Result<Vec<SearchHit>, ProviderError>;
}

/// Text completion backend that synthesizes an answer from search hits
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Produce an answer for `query`; sources mirror `hits` 1:1
    async fn answer(
        &self,
        query: &str,
        hits: &[SearchHit],
    ) -> Result<AnswerResponse, ProviderError>;
}
